pub mod data;
pub mod gamma;

use anyhow::Context;
use std::time::Duration;
use thiserror::Error;

/// Failures from the public Polymarket APIs. The pipeline treats every
/// variant the same way: log, skip the cycle, keep existing state.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Shared HTTP client for both the data API and the Gamma API.
pub fn http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("polywhale/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(10))
        .build()
        .context("build http client")
}
