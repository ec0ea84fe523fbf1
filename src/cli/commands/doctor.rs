//! Doctor command - verify credentials and configuration.

use crate::cli::{preflight, Output};
use crate::config::{Settings, CHAT_KEY_ENV, YOUTUBE_KEY_ENV};
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Sentinel Doctor");
    println!();

    let checks = collect_checks(settings, config_path, |var| std::env::var(var).ok());

    println!("{}", style("Configuration").bold());
    for check in &checks {
        check.print();
    }
    println!();

    let errors = checks
        .iter()
        .filter(|c| c.status == CheckStatus::Error)
        .count();
    let warnings = checks
        .iter()
        .filter(|c| c.status == CheckStatus::Warning)
        .count();

    if errors > 0 {
        Output::error(&format!("{} problem(s) must be fixed before analysing.", errors));
    } else if warnings > 0 {
        Output::warning(&format!("Ready, with {} warning(s).", warnings));
    } else {
        Output::success("Everything looks good.");
    }

    Ok(())
}

fn collect_checks(
    settings: &Settings,
    config_path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Vec<CheckResult> {
    let mut checks = Vec::new();

    if config_path.exists() {
        checks.push(CheckResult::ok(
            "Config file",
            &config_path.display().to_string(),
        ));
    } else {
        checks.push(CheckResult::warning(
            "Config file",
            "not found, using defaults",
            "Run 'sentinel config edit' to create one",
        ));
    }

    checks.push(credential_check(
        "YouTube API key",
        YOUTUBE_KEY_ENV,
        env(YOUTUBE_KEY_ENV).as_deref(),
        settings.youtube.api_key.as_deref(),
        "youtube.api_key",
    ));
    checks.push(credential_check(
        "Chat API key",
        CHAT_KEY_ENV,
        env(CHAT_KEY_ENV).as_deref(),
        settings.chat.api_key.as_deref(),
        "chat.api_key",
    ));

    checks.push(CheckResult::ok(
        "Chat model",
        &format!("{} via {}", settings.chat.model, settings.chat.api_base),
    ));

    match preflight::check_pricing(settings) {
        Ok(()) => checks.push(CheckResult::ok(
            "Pricing",
            &format!(
                "${}/M in, ${}/M out, 1 USD = {} {}",
                settings.pricing.input_usd_per_million,
                settings.pricing.output_usd_per_million,
                settings.pricing.exchange_rate,
                settings.pricing.currency
            ),
        )),
        Err(e) => checks.push(CheckResult::error(
            "Pricing",
            &e.to_string(),
            "Fix the [pricing] section of the config file",
        )),
    }

    checks
}

fn credential_check(
    name: &str,
    var: &str,
    from_env: Option<&str>,
    configured: Option<&str>,
    config_key: &str,
) -> CheckResult {
    let present = |v: Option<&str>| v.is_some_and(|k| !k.trim().is_empty());

    if present(from_env) {
        CheckResult::ok(name, &format!("set via {}", var))
    } else if present(configured) {
        CheckResult::ok(name, &format!("set in config ({})", config_key))
    } else {
        CheckResult::error(
            name,
            "not set",
            &format!("export {}='...' or set {} in the config file", var, config_key),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABSENT: &str = "/nonexistent/sentinel.toml";

    fn find<'a>(checks: &'a [CheckResult], name: &str) -> &'a CheckResult {
        checks.iter().find(|c| c.name == name).unwrap()
    }

    #[test]
    fn test_missing_credentials_are_errors() {
        let checks = collect_checks(&Settings::default(), Path::new(ABSENT), |_| None);
        assert_eq!(find(&checks, "Config file").status, CheckStatus::Warning);
        assert_eq!(find(&checks, "YouTube API key").status, CheckStatus::Error);
        assert_eq!(find(&checks, "Chat API key").status, CheckStatus::Error);
        assert_eq!(find(&checks, "Pricing").status, CheckStatus::Ok);
    }

    #[test]
    fn test_credentials_from_env_and_config() {
        let mut settings = Settings::default();
        settings.chat.api_key = Some("from-file".to_string());

        let checks = collect_checks(&settings, Path::new(ABSENT), |var| {
            (var == YOUTUBE_KEY_ENV).then(|| "from-env".to_string())
        });
        let youtube = find(&checks, "YouTube API key");
        assert_eq!(youtube.status, CheckStatus::Ok);
        assert!(youtube.message.contains(YOUTUBE_KEY_ENV));
        let chat = find(&checks, "Chat API key");
        assert_eq!(chat.status, CheckStatus::Ok);
        assert!(chat.message.contains("config"));
    }

    #[test]
    fn test_config_file_check_uses_active_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentinel.toml");
        Settings::default().save_to(&path).unwrap();

        let checks = collect_checks(&Settings::default(), &path, |_| None);
        let config = find(&checks, "Config file");
        assert_eq!(config.status, CheckStatus::Ok);
        assert_eq!(config.message, path.display().to_string());
    }
}
