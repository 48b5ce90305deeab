//! Serverless text services: speech reformatting, voice synthesis and
//! poem analysis. All three take the same `{title, poet, lines}` body.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ServicesConfig;
use crate::error::{FetchError, FetchResult};
use crate::inflight::cancellable;
use crate::protocol::{PoemPayload, TextReply, VoiceReply};

/// Which reformatter to use; each prepares text for a different voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatTarget {
    /// Local speech engine.
    LocalVoice,
    /// Remote voice-synthesis service.
    SyntheticVoice,
}

#[derive(Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    config: ServicesConfig,
}

impl ServiceClient {
    pub fn new(http: reqwest::Client, config: ServicesConfig) -> Self {
        Self { http, config }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs.max(1))
    }

    /// Rewrite poem text so it reads well aloud.
    pub async fn format_for_speech(
        &self,
        target: FormatTarget,
        payload: &PoemPayload<'_>,
        cancel: &CancellationToken,
    ) -> FetchResult<String> {
        let url = match target {
            FormatTarget::LocalVoice => &self.config.format_url,
            FormatTarget::SyntheticVoice => &self.config.voice_format_url,
        };
        debug!("[services] formatting {:?} for {:?}", payload.title, target);
        let reply: TextReply = self.post_json(url, payload, cancel).await?;
        non_empty(reply.result, "formatter returned no text")
    }

    /// Synthesize speech. Returns the base64 payload exactly as received.
    pub async fn synthesize(
        &self,
        payload: &PoemPayload<'_>,
        cancel: &CancellationToken,
    ) -> FetchResult<String> {
        let reply: VoiceReply = self.post_json(&self.config.voice_url, payload, cancel).await?;
        let audio = non_empty(reply.audio_base64, "voice service returned no audio")?;
        info!("[services] received {} base64 bytes of audio", audio.len());
        Ok(audio)
    }

    /// Ask for a short commentary on the poem.
    pub async fn analyze(
        &self,
        payload: &PoemPayload<'_>,
        cancel: &CancellationToken,
    ) -> FetchResult<String> {
        let reply: TextReply = self
            .post_json(&self.config.analysis_url, payload, cancel)
            .await?;
        non_empty(reply.result, "analysis returned no text")
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        payload: &PoemPayload<'_>,
        cancel: &CancellationToken,
    ) -> FetchResult<T> {
        cancellable(cancel, async {
            let response = self
                .http
                .post(url)
                .timeout(self.timeout())
                .json(payload)
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

fn non_empty(value: Option<String>, what: &str) -> FetchResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| FetchError::MissingData(what.to_string()))
}
