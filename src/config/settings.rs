//! Configuration settings for Sentinel.

use crate::error::{Result, SentinelError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the YouTube Data API key.
pub const YOUTUBE_KEY_ENV: &str = "YOUTUBE_KEY";

/// Environment variable holding the chat API key.
pub const CHAT_KEY_ENV: &str = "GEMINI_KEY";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub chat: ChatSettings,
    pub youtube: YoutubeSettings,
    pub pricing: PricingSettings,
    pub prompts: PromptSettings,
    pub server: ServerSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Chat API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Model used for every turn of the conversation.
    pub model: String,
    /// Base URL of the OpenAI-compatible chat endpoint.
    pub api_base: String,
    /// API key (the GEMINI_KEY environment variable takes precedence).
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            api_base: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            api_key: None,
            timeout_seconds: crate::openai::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// YouTube metadata and transcript settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// YouTube Data API key (the YOUTUBE_KEY environment variable takes precedence).
    pub api_key: Option<String>,
    /// Preferred caption language.
    pub transcript_language: String,
    /// Videos endpoint of the YouTube Data API.
    pub metadata_url: String,
    /// Caption track endpoint.
    pub transcript_url: String,
    /// Maximum number of body characters embedded in the summary prompt.
    pub max_content_chars: usize,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            transcript_language: "ja".to_string(),
            metadata_url: "https://www.googleapis.com/youtube/v3/videos".to_string(),
            transcript_url: "https://www.youtube.com/api/timedtext".to_string(),
            max_content_chars: 6000,
        }
    }
}

/// Token pricing used for cost estimates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingSettings {
    /// Input price in USD per million tokens.
    pub input_usd_per_million: f64,
    /// Output price in USD per million tokens.
    pub output_usd_per_million: f64,
    /// Units of the display currency per USD.
    pub exchange_rate: f64,
    /// Display currency code.
    pub currency: String,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            input_usd_per_million: 0.10,
            output_usd_per_million: 0.40,
            exchange_rate: 150.0,
            currency: "JPY".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory containing an `analysis.toml` that overrides the default prompts.
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

/// HTTP API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Seconds a session may stay unused before it is discarded.
    pub session_ttl_seconds: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            session_ttl_seconds: crate::session::DEFAULT_SESSION_TTL_SECS,
        }
    }
}

/// The two upstream credentials, resolved once at startup.
#[derive(Clone)]
pub struct Credentials {
    pub youtube_key: String,
    pub chat_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("youtube_key", &"<redacted>")
            .field("chat_key", &"<redacted>")
            .finish()
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SentinelError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sentinel")
            .join("config.toml")
    }

    /// Resolve both credentials, preferring the environment over the config file.
    pub fn credentials(&self) -> Result<Credentials> {
        Ok(Credentials {
            youtube_key: resolve_key(YOUTUBE_KEY_ENV, self.youtube.api_key.as_deref())?,
            chat_key: resolve_key(CHAT_KEY_ENV, self.chat.api_key.as_deref())?,
        })
    }
}

fn resolve_key(var: &'static str, configured: Option<&str>) -> Result<String> {
    let from_env = std::env::var(var).ok();
    pick_key(from_env.as_deref(), configured).ok_or(SentinelError::MissingCredential(var))
}

fn pick_key(from_env: Option<&str>, configured: Option<&str>) -> Option<String> {
    [from_env, configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|k| !k.is_empty())
        .map(str::to_string)
}
