//! Art Institute of Chicago client.
//!
//! A random artwork is found in four calls: search (for the page count),
//! a random page, the chosen item's detail record, and finally the IIIF
//! image itself. Every call races the caller's cancellation token.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ArtConfig;
use crate::error::{FetchError, FetchResult};
use crate::inflight::cancellable;
use crate::protocol::{ArtworkRecord, ArtworkResult, DetailResponse, SearchResponse};
use crate::text::strip_html;

const SEARCH_FIELDS: &str = "id,api_link,title,artist_title,date_display,style_titles,image_id";

#[derive(Clone)]
pub struct ArtClient {
    http: reqwest::Client,
    config: ArtConfig,
}

impl ArtClient {
    pub fn new(http: reqwest::Client, config: ArtConfig) -> Self {
        Self { http, config }
    }

    /// Find a random artwork that has an image. Records without an image id
    /// restart the whole search, up to `max_attempts` times.
    pub async fn fetch_random(&self, cancel: &CancellationToken) -> FetchResult<ArtworkResult> {
        let attempts = self.config.max_attempts.max(1);
        for attempt in 1..=attempts {
            let style = pick_style(&self.config.styles, &mut rand::thread_rng())
                .ok_or_else(|| FetchError::MissingData("no style facets configured".into()))?;
            match self.fetch_once(&style, cancel).await {
                Ok(result) => return Ok(result),
                Err(FetchError::MissingData(reason)) => {
                    debug!("[art] attempt {}/{} ({}): {}", attempt, attempts, style, reason);
                }
                Err(e) => return Err(e),
            }
        }
        warn!("[art] gave up after {} attempts without an image", attempts);
        Err(FetchError::MissingData(format!(
            "no artwork with an image after {} attempts",
            attempts
        )))
    }

    async fn fetch_once(&self, style: &str, cancel: &CancellationToken) -> FetchResult<ArtworkResult> {
        let search_url = format!("{}/artworks/search", self.config.api_base.trim_end_matches('/'));
        let limit = self.config.page_limit.max(1).to_string();
        let base_query = [
            ("query[term][style_titles.keyword]", style),
            ("fields", SEARCH_FIELDS),
            ("limit", limit.as_str()),
        ];

        let first: SearchResponse = self
            .get_json(cancel, self.http.get(&search_url).query(&base_query))
            .await?;
        let pages = first
            .pagination
            .as_ref()
            .and_then(|p| p.total_pages)
            .unwrap_or(1);
        let total = first
            .pagination
            .as_ref()
            .and_then(|p| p.total)
            .unwrap_or(first.data.len() as u64);
        debug!("[art] {} artworks over {} pages for {:?}", total, pages, style);

        let page = pick_page(pages, self.config.max_page(), &mut rand::thread_rng());
        let page_str = page.to_string();
        let listing: SearchResponse = self
            .get_json(
                cancel,
                self.http
                    .get(&search_url)
                    .query(&base_query)
                    .query(&[("page", page_str.as_str())]),
            )
            .await?;

        let hit = listing
            .data
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| FetchError::MissingData(format!("page {} is empty", page)))?;
        let detail_url = hit.api_link.clone().unwrap_or_else(|| {
            format!("{}/artworks/{}", self.config.api_base.trim_end_matches('/'), hit.id)
        });

        let detail: DetailResponse = self.get_json(cancel, self.http.get(&detail_url)).await?;
        let record = detail.data;
        let image_id = record
            .image_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| FetchError::MissingData(format!("artwork {} has no image id", record.id)))?;

        let image_url = image_url(&self.config.iiif_base, &image_id, self.config.image_width);
        info!("[art] selected #{} {:?} (page {})", record.id, record.title, page);
        Ok(to_result(record, image_url, style))
    }

    /// Download the rendered image bytes.
    pub async fn fetch_image(&self, url: &str, cancel: &CancellationToken) -> FetchResult<Vec<u8>> {
        cancellable(cancel, async {
            let response = self.http.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
            Ok(response.bytes().await?.to_vec())
        })
        .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        request: reqwest::RequestBuilder,
    ) -> FetchResult<T> {
        cancellable(cancel, async {
            let response = request.header("Accept", "application/json").send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: response.url().to_string(),
                    status: status.as_u16(),
                });
            }
            let bytes = response.bytes().await?;
            Ok(serde_json::from_slice(&bytes)?)
        })
        .await
    }
}

/// `{iiif_base}/{image_id}/full/{width},/0/default.jpg`
pub fn image_url(iiif_base: &str, image_id: &str, width: u32) -> String {
    format!(
        "{}/{}/full/{},/0/default.jpg",
        iiif_base.trim_end_matches('/'),
        image_id,
        width
    )
}

/// Uniform page in `1..=min(total_pages, max_page)`.
pub fn pick_page<R: Rng>(total_pages: u32, max_page: u32, rng: &mut R) -> u32 {
    let upper = total_pages.min(max_page).max(1);
    rng.gen_range(1..=upper)
}

pub fn pick_style<R: Rng>(styles: &[String], rng: &mut R) -> Option<String> {
    styles.choose(rng).cloned()
}

fn to_result(record: ArtworkRecord, image_url: String, style: &str) -> ArtworkResult {
    let date_range = record.date_range();
    let artist = record
        .artist_title
        .clone()
        .or_else(|| record.artist_display.clone())
        .unwrap_or_else(|| "Unknown artist".to_string());
    ArtworkResult {
        id: record.id,
        image_url: Some(image_url),
        title: record.title.unwrap_or_else(|| "Untitled".to_string()),
        artist,
        date_range,
        origin: record.place_of_origin.unwrap_or_default(),
        kind: record.artwork_type_title.unwrap_or_default(),
        description: record
            .description
            .as_deref()
            .map(strip_html)
            .unwrap_or_default(),
        style: style.to_string(),
    }
}
