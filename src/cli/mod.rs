//! CLI module for Sentinel.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Sentinel - YouTube summaries and chart analysis
///
/// Paste a YouTube URL to get a summary, or a chart image URL to get an analysis,
/// then keep asking follow-up questions in the same conversation.
#[derive(Parser, Debug)]
#[command(name = "sentinel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarise a YouTube video or analyse a chart image, once
    Analyze {
        /// YouTube URL or chart image URL
        url: String,
    },

    /// Start an interactive session with follow-up questions
    Chat {
        /// URL to analyse first (otherwise prompted for)
        url: Option<String>,
    },

    /// Start the HTTP server with per-session conversations
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Check credentials and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
