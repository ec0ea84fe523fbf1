//! Interactive session: one analysis, then follow-up questions.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{AnalysisReport, Orchestrator};
use crate::session::ConversationSession;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// What a line typed at the prompt asks for.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    Exit,
    History,
    Analyze(&'a str),
    Ask(&'a str),
}

/// Interpret one line. Plain lines are URLs until the session is active.
fn parse_input(line: &str, active: bool) -> Input<'_> {
    let line = line.trim();

    if line.is_empty() {
        return Input::Empty;
    }
    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return Input::Exit;
    }
    if line.eq_ignore_ascii_case("/history") {
        return Input::History;
    }
    let (command, argument) = line
        .split_once(char::is_whitespace)
        .unwrap_or((line, ""));
    if command == "/analyze" {
        let url = argument.trim();
        return if url.is_empty() {
            Input::Empty
        } else {
            Input::Analyze(url)
        };
    }

    if active {
        Input::Ask(line)
    } else {
        Input::Analyze(line)
    }
}

/// Run the interactive chat command.
pub async fn run_chat(url: Option<String>, settings: Settings) -> Result<()> {
    let credentials = super::credentials_or_report(&settings)?;
    let orchestrator = Orchestrator::new(&settings, &credentials)?;
    let mut session = orchestrator.start_session();

    println!("\n{}", style("Sentinel").bold().cyan());
    println!(
        "{}\n",
        style("Paste a YouTube URL or chart image URL. After an analysis, ask follow-up questions.\nUse '/analyze <url>' for another analysis, '/history' for the turn count, 'exit' to quit.").dim()
    );

    if let Some(url) = url.as_deref() {
        analyze(&orchestrator, &mut session, url).await;
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        let label = if session.is_active() { "You:" } else { "URL:" };
        print!("{} ", style(label).green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match parse_input(&line, session.is_active()) {
            Input::Empty => continue,
            Input::Exit => {
                Output::info("Goodbye!");
                break;
            }
            Input::History => {
                Output::info(&format!("{} turns in this conversation.", session.history().len()));
            }
            Input::Analyze(url) => analyze(&orchestrator, &mut session, url).await,
            Input::Ask(question) => {
                let spinner = Output::spinner("Answering...");
                let result = orchestrator.ask(&mut session, question).await;
                spinner.finish_and_clear();

                match result {
                    Ok(answer) => Output::reply(&answer),
                    Err(e) => Output::error(&format!("{:?}", anyhow::Error::from(e))),
                }
            }
        }
    }

    debug!("Discarding session with {} turns", session.history().len());
    Ok(())
}

async fn analyze(orchestrator: &Orchestrator, session: &mut ConversationSession, url: &str) {
    let spinner = Output::spinner("Analyzing...");
    let report = orchestrator.analyze(session, url).await;
    spinner.finish_and_clear();

    match report {
        AnalysisReport::Completed(answer) => Output::analysis(&answer),
        AnalysisReport::Failed(message) => Output::error(&message),
    }
}
