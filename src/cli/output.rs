//! CLI output formatting utilities.

use crate::orchestrator::Answer;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print the estimated cost of a reply.
    pub fn cost(display: &str) {
        println!("{} Estimated cost: {}", style(">>").yellow().bold(), display);
    }

    /// Print a completed analysis: success line, cost, then the reply.
    pub fn analysis(answer: &Answer) {
        match &answer.title {
            Some(title) => Output::success(&format!("Analysis complete: {}", style(title).bold())),
            None => Output::success("Analysis complete!"),
        }
        Output::cost(&answer.cost_display);
        println!("\n{}\n", answer.text);
    }

    /// Print a follow-up reply with its cost.
    pub fn reply(answer: &Answer) {
        println!("\n{} {}\n", style("Sentinel:").cyan().bold(), answer.text);
        println!("{}", style(format!("Cost: {}", answer.cost_display)).dim());
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}
