//! Shared core for easel: configuration, the refresh scheduler, request
//! slots and the HTTP clients for artworks, poems and text services.

pub mod art;
pub mod config;
pub mod error;
pub mod inflight;
pub mod platform;
pub mod poems;
pub mod protocol;
pub mod schedule;
pub mod services;
pub mod text;

use std::time::Duration;

/// Shared HTTP client. Per-request timeouts are applied by the callers that
/// need them (the serverless services are slow).
pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("easel/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .build()
}
