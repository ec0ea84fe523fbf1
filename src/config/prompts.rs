//! Prompt templates for Sentinel.
//!
//! Prompts can be customized by placing an `analysis.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub analysis: AnalysisPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts sent at the start of an analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisPrompts {
    /// Video summary request. Placeholders: `{{title}}`, `{{content}}`.
    pub video_summary: String,
    /// Chart analysis request, sent together with the image.
    pub chart_analysis: String,
}

impl Default for AnalysisPrompts {
    fn default() -> Self {
        Self {
            video_summary: "銀CFD投資家の視点で、この動画を要約してください。\n\nタイトル: {{title}}\n内容: {{content}}".to_string(),
            chart_analysis: "銀CFDのプロトレーダーとして、このチャートを分析してください。".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let analysis_path = custom_path.join("analysis.toml");
            if analysis_path.exists() {
                let content = std::fs::read_to_string(&analysis_path)?;
                prompts.analysis = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is single-pass: placeholders appearing inside substituted
    /// values are left as they are.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let key = &after[..end];
                    match vars.get(key) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(key);
                            result.push_str("}}");
                        }
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// Build the video summary prompt.
    pub fn video_summary(&self, title: &str, content: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("title".to_string(), title.to_string());
        vars.insert("content".to_string(), content.to_string());
        self.render_with_custom(&self.analysis.video_summary, &vars)
    }

    /// Build the chart analysis prompt.
    pub fn chart_analysis(&self) -> String {
        self.render_with_custom(&self.analysis.chart_analysis, &HashMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.analysis.video_summary.contains("{{title}}"));
        assert!(prompts.analysis.video_summary.contains("{{content}}"));
        assert!(prompts.analysis.video_summary.starts_with("銀CFD投資家の視点で"));
        assert_eq!(
            prompts.chart_analysis(),
            "銀CFDのプロトレーダーとして、このチャートを分析してください。"
        );
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_leaves_unknown_and_nested_placeholders() {
        let mut vars = HashMap::new();
        vars.insert("title".to_string(), "{{content}}".to_string());
        vars.insert("content".to_string(), "body".to_string());

        let result = Prompts::render("{{title}} / {{content}} / {{other}} / {{open", &vars);
        assert_eq!(result, "{{content}} / body / {{other}} / {{open");
    }

    #[test]
    fn test_video_summary_uses_custom_variables() {
        let mut prompts = Prompts::default();
        prompts.analysis.video_summary = "[{{persona}}] {{title}}: {{content}}".to_string();
        prompts
            .variables
            .insert("persona".to_string(), "Jenny".to_string());

        assert_eq!(prompts.video_summary("T", "D"), "[Jenny] T: D");
    }

    #[test]
    fn test_load_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("analysis.toml"),
            "chart_analysis = \"Read this chart.\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.chart_analysis(), "Read this chart.");
        assert!(prompts.analysis.video_summary.contains("{{title}}"));
    }
}
