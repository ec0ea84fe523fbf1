//! Error types for Sentinel.

use thiserror::Error;

/// Library-level error type for Sentinel operations.
#[derive(Error, Debug)]
pub enum SentinelError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing credential: {0} is not set. Export it or add it to the config file.")]
    MissingCredential(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("Transcript unavailable: {0}")]
    TranscriptUnavailable(String),

    #[error("Chat API error: {0}")]
    Chat(String),

    #[error("No conversation yet: run an analysis before asking follow-up questions")]
    SessionInactive,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type alias for Sentinel operations.
pub type Result<T> = std::result::Result<T, SentinelError>;
