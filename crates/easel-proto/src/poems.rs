//! Poem sources: PoetryDB driven by a curated author list, and an optional
//! single-call endpoint that returns a ready-made poem.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::PoemsConfig;
use crate::error::{FetchError, FetchResult};
use crate::inflight::cancellable;
use crate::protocol::{
    PoemResult, PoemSource, PoetryDbPoem, PoetryDbReply, ServerlessPoem, TitleEntry,
};

#[derive(Clone)]
pub struct PoemClient {
    http: reqwest::Client,
    config: PoemsConfig,
}

impl PoemClient {
    pub fn new(http: reqwest::Client, config: PoemsConfig) -> Self {
        Self { http, config }
    }

    /// Pick a source with equal odds and fetch one poem from it.
    pub async fn fetch_random(&self, cancel: &CancellationToken) -> FetchResult<PoemResult> {
        let source = choose_source(
            self.config.random_poem_url.is_some(),
            &mut rand::thread_rng(),
        );
        debug!("[poem] source: {:?}", source);
        match source {
            PoemSource::Curated => self.fetch_curated(cancel).await,
            PoemSource::Serverless => self.fetch_serverless(cancel).await,
        }
    }

    /// Random author → random title by that author → full text.
    pub async fn fetch_curated(&self, cancel: &CancellationToken) -> FetchResult<PoemResult> {
        let author = self
            .config
            .authors
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| FetchError::MissingData("no authors configured".into()))?;
        let base = self.config.poetrydb_base.trim_end_matches('/');

        let titles: Vec<TitleEntry> = self
            .poetrydb(cancel, format!("{}/author/{}/title", base, encode_segment(&author)))
            .await?;
        let title = titles
            .choose(&mut rand::thread_rng())
            .map(|t| t.title.clone())
            .ok_or_else(|| FetchError::MissingData(format!("no titles for {}", author)))?;
        debug!("[poem] {} — {:?}", author, title);

        let poems: Vec<PoetryDbPoem> = self
            .poetrydb(cancel, format!("{}/title/{}", base, encode_segment(&title)))
            .await?;
        // Title lookups are substring matches; prefer the author we asked for.
        let poem = poems
            .iter()
            .find(|p| p.author == author && p.title == title)
            .or_else(|| poems.first())
            .ok_or_else(|| FetchError::MissingData(format!("no text for {:?}", title)))?;

        info!("[poem] {} by {} ({} lines)", poem.title, poem.author, poem.lines.len());
        Ok(PoemResult {
            author: poem.author.clone(),
            title: poem.title.clone(),
            lines: poem.lines.clone(),
            source: PoemSource::Curated,
        })
    }

    /// Single call to the configured random-poem endpoint.
    pub async fn fetch_serverless(&self, cancel: &CancellationToken) -> FetchResult<PoemResult> {
        let url = self
            .config
            .random_poem_url
            .clone()
            .ok_or_else(|| FetchError::Unsupported("random_poem_url is not configured".into()))?;
        let poem: ServerlessPoem = self.get_json(cancel, &url).await?;
        if poem.text.trim().is_empty() {
            return Err(FetchError::MissingData("random poem had no text".into()));
        }
        info!("[poem] {} by {} (serverless)", poem.title, poem.author);
        Ok(PoemResult {
            author: poem.author,
            title: poem.title,
            lines: poem.text.lines().map(|l| l.to_string()).collect(),
            source: PoemSource::Serverless,
        })
    }

    async fn poetrydb<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        url: String,
    ) -> FetchResult<Vec<T>> {
        match self.get_json::<PoetryDbReply<T>>(cancel, &url).await? {
            PoetryDbReply::Found(items) if !items.is_empty() => Ok(items),
            PoetryDbReply::Found(_) => Err(FetchError::MissingData(format!("{} returned nothing", url))),
            PoetryDbReply::Miss { status, reason } => Err(FetchError::MissingData(format!(
                "{} answered {} {}",
                url, status, reason
            ))),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        url: &str,
    ) -> FetchResult<T> {
        cancellable(cancel, async {
            let response = self
                .http
                .get(url)
                .header("Accept", "application/json")
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
            let bytes = response.bytes().await?;
            Ok(serde_json::from_slice(&bytes)?)
        })
        .await
    }
}

/// Equal odds between the two sources when the serverless one is configured.
pub fn choose_source<R: Rng>(serverless_available: bool, rng: &mut R) -> PoemSource {
    if serverless_available && rng.gen_bool(0.5) {
        PoemSource::Serverless
    } else {
        PoemSource::Curated
    }
}

/// Percent-encode a single URL path segment.
pub fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
