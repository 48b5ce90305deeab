//! Error taxonomy shared by every fetch family and the speech dispatcher.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, timeout, body read).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The remote answered with a non-2xx status.
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    /// The request was superseded or the app is shutting down.
    #[error("request cancelled")]
    Cancelled,

    /// The payload parsed but lacks something we need (no image id, empty list).
    #[error("missing data: {0}")]
    MissingData(String),

    #[error("malformed payload: {0}")]
    Decode(String),

    /// A local capability (speech engine, audio player) is not available.
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Cancellation is an expected outcome, never shown to the user.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
