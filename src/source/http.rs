//! Raw HTTP downloads.

use super::RawFetcher;
use crate::error::{Result, SentinelError};
use async_trait::async_trait;
use tracing::instrument;

/// Fetches arbitrary URLs with a shared reqwest client.
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl RawFetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let url = url::Url::parse(url.trim())
            .map_err(|e| SentinelError::InvalidInput(format!("Not a valid URL '{}': {}", url, e)))?;

        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SentinelError::Fetch(format!(
                "GET {} returned status {}",
                url, status
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
