//! Trending repositories client.
//!
//! Wraps a third-party trending-repositories JSON API. The upstream needs no
//! authentication and its payload schema is not ours to define, so responses
//! are passed through verbatim as `serde_json::Value`.

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::config::TrendingConfig;

/// Trending API errors
#[derive(Error, Debug)]
pub enum TrendingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Trending API error ({code})")]
    Api { code: u16 },
}

/// Trending repositories client.
#[derive(Debug, Clone)]
pub struct TrendingClient {
    client: Client,
    base_url: String,
}

impl TrendingClient {
    pub fn new(config: &TrendingConfig) -> Result<Self, TrendingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch one page of trending repositories across all languages.
    pub async fn repositories(&self, page: u32) -> Result<serde_json::Value, TrendingError> {
        let url = format!("{}/repositories", self.base_url);
        let page = page.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[("language", "all"), ("page", &page)])
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            tracing::error!(code = status.as_u16(), "Trending API error");
            return Err(TrendingError::Api {
                code: status.as_u16(),
            });
        }

        Ok(response.json().await?)
    }
}

// ============================================================================
// TESTS
// ============================================================================
