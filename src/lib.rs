//! Sentinel - YouTube summaries and chart analysis with a hosted LLM
//!
//! Paste a YouTube URL or a chart image URL and get the model's summary or
//! analysis, with an estimated cost for every call. The conversation is kept,
//! so follow-up questions reuse the earlier context.
//!
//! # Architecture
//!
//! - `config` - Settings, credentials and prompt templates
//! - `source` - Video id extraction, YouTube metadata/captions, raw downloads
//! - `session` - Conversation log and the chat backend
//! - `cost` - Token usage to money
//! - `orchestrator` - The analyze and ask flows
//! - `cli` - Command line and HTTP surfaces
//!
//! # Example
//!
//! ```rust,no_run
//! use sentinel::config::Settings;
//! use sentinel::orchestrator::{AnalysisReport, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let credentials = settings.credentials()?;
//!     let orchestrator = Orchestrator::new(&settings, &credentials)?;
//!     let mut session = orchestrator.start_session();
//!
//!     if let AnalysisReport::Completed(answer) = orchestrator
//!         .analyze(&mut session, "https://www.youtube.com/watch?v=dQw4w9WgXcQ")
//!         .await
//!     {
//!         println!("{} ({})", answer.text, answer.cost_display);
//!         let follow_up = orchestrator.ask(&mut session, "Where is support?").await?;
//!         println!("{}", follow_up.text);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod cost;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod session;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, SentinelError};
