//! Analyze command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{AnalysisReport, Orchestrator};
use anyhow::Result;

/// Run a single analysis and print the result.
pub async fn run_analyze(url: &str, settings: Settings) -> Result<()> {
    let credentials = super::credentials_or_report(&settings)?;

    if url.trim().is_empty() {
        anyhow::bail!("Paste a YouTube URL or chart image URL");
    }

    let orchestrator = Orchestrator::new(&settings, &credentials)?;
    let mut session = orchestrator.start_session();

    let spinner = Output::spinner("Analyzing...");
    let report = orchestrator.analyze(&mut session, url).await;
    spinner.finish_and_clear();

    match report {
        AnalysisReport::Completed(answer) => {
            Output::analysis(&answer);
            Ok(())
        }
        AnalysisReport::Failed(message) => {
            Output::error(&message);
            anyhow::bail!("analysis failed")
        }
    }
}
