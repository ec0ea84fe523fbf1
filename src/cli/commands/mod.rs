//! CLI command implementations.

mod analyze;
mod chat;
mod config;
mod doctor;
mod serve;

pub use analyze::run_analyze;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use serve::run_serve;

use crate::cli::preflight;
use crate::cli::Output;
use crate::config::{Credentials, Settings};

/// Resolve credentials, printing a diagnostic hint when they are missing.
fn credentials_or_report(settings: &Settings) -> anyhow::Result<Credentials> {
    preflight::require_credentials(settings).map_err(|e| {
        Output::error(&format!("{}", e));
        Output::info("Run 'sentinel doctor' for detailed diagnostics.");
        e.into()
    })
}
