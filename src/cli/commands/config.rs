//! Config command: inspect or edit the active configuration file.
//!
//! Every action works on the file the process was started with, so
//! `sentinel -c other.toml config edit` opens the same file that
//! `sentinel -c other.toml config show` reports.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::{Context, Result};
use std::path::Path;

const REDACTED: &str = "<redacted>";

/// Run the config command against `config_path`.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => show(settings, config_path),
        ConfigAction::Edit => edit(&settings, config_path),
        ConfigAction::Path => {
            println!("{}", config_path.display());
            Ok(())
        }
    }
}

fn show(settings: Settings, config_path: &Path) -> Result<()> {
    let origin = if config_path.exists() {
        config_path.display().to_string()
    } else {
        format!("{} (not created, showing defaults)", config_path.display())
    };
    Output::kv("Config", &origin);
    println!();

    let rendered = toml::to_string_pretty(&redacted(settings))
        .context("Failed to serialize configuration")?;
    println!("{}", rendered);
    Ok(())
}

fn edit(settings: &Settings, config_path: &Path) -> Result<()> {
    if write_if_missing(settings, config_path)? {
        Output::info(&format!("Created {}", config_path.display()));
    }

    let editor = editor_command(|var| std::env::var(var).ok());
    Output::info(&format!("Opening {} in {}...", config_path.display(), editor));

    match std::process::Command::new(&editor).arg(config_path).status() {
        Ok(status) if status.success() => Output::success("Config saved."),
        Ok(status) => Output::warning(&format!("{} exited with {}", editor, status)),
        Err(e) => {
            Output::error(&format!("Could not start {}: {}", editor, e));
            Output::info(&format!("Edit the file by hand: {}", config_path.display()));
        }
    }
    Ok(())
}

/// Copy of `settings` that is safe to print.
fn redacted(mut settings: Settings) -> Settings {
    for key in [&mut settings.youtube.api_key, &mut settings.chat.api_key] {
        if key.is_some() {
            *key = Some(REDACTED.to_string());
        }
    }
    settings
}

/// Seed the file with the current settings. Returns true when it was created.
fn write_if_missing(settings: &Settings, config_path: &Path) -> Result<bool> {
    if config_path.exists() {
        return Ok(false);
    }
    settings
        .save_to(config_path)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    Ok(true)
}

fn editor_command(env: impl Fn(&str) -> Option<String>) -> String {
    ["VISUAL", "EDITOR"]
        .into_iter()
        .filter_map(|var| env(var))
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "vim".to_string())
}
