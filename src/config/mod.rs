//! Configuration module for Sentinel.
//!
//! Handles loading application settings, credentials and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnalysisPrompts, Prompts};
pub use settings::{
    ChatSettings, Credentials, GeneralSettings, PricingSettings, PromptSettings, ServerSettings,
    Settings, YoutubeSettings, CHAT_KEY_ENV, YOUTUBE_KEY_ENV,
};
