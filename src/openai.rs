//! Client construction for the OpenAI-compatible chat endpoint.

use crate::error::{Result, SentinelError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for chat API requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create a chat client for the given key and base URL with a request timeout.
pub fn create_client_with_timeout(
    api_key: &str,
    api_base: &str,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SentinelError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let config = OpenAIConfig::new()
        .with_api_key(api_key)
        .with_api_base(api_base.trim_end_matches('/'));

    Ok(Client::with_config(config).with_http_client(http_client))
}
