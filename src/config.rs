//! Build configuration.
//!
//! Handles loading, validating, and merging `outline-site.toml`. Stock
//! defaults are overridden by whatever the user file specifies; a missing
//! file means "all defaults".
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [outline]
//! keywords = ["Тема", "Розділ", "Частина", "Підтема", "Topic", "Part", "Section", "Chapter"]
//!
//! [pages]
//! index_file = "index.md"
//! qa_file = "qa.md"
//! layout = "default"
//! home_layout = "home"
//! home_title = "Home"
//! home_heading = "Welcome to the Documentation"
//! placeholder = "This is a placeholder for the content."
//! qa_min_level = 3          # Nodes this deep also get a Q&A page
//! numbered_titles = true    # "1.2 Basics" instead of "Basics"
//! qa_link_label = "Go to Q&A"
//! back_link_label = "Back to theory"
//!
//! [filler]
//! command = "my-llm-wrapper"  # Unset by default; required by `fill`
//! prompts_dir = "prompt"
//! queue_file = "files_to_process.txt"
//! fail_log = "fail_process.txt"
//! summary_limit = 4000
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use crate::outline::DEFAULT_KEYWORDS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Outline parsing settings.
    pub outline: OutlineConfig,
    /// Generated page layout and naming.
    pub pages: PagesConfig,
    /// Content filler and queue settings.
    pub filler: FillerConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pages.qa_min_level == 0 {
            return Err(ConfigError::Validation(
                "pages.qa_min_level must be at least 1".into(),
            ));
        }
        for (key, name) in [
            ("pages.index_file", &self.pages.index_file),
            ("pages.qa_file", &self.pages.qa_file),
        ] {
            if !is_page_file_name(name) {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a plain `.md` file name, got {name:?}"
                )));
            }
        }
        if self.pages.index_file == self.pages.qa_file {
            return Err(ConfigError::Validation(
                "pages.index_file and pages.qa_file must differ".into(),
            ));
        }
        if self.filler.summary_limit == 0 {
            return Err(ConfigError::Validation(
                "filler.summary_limit must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

fn is_page_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && name.len() > 3
        && name.ends_with(".md")
}

/// Outline parsing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutlineConfig {
    /// Section-label words stripped from titles ("Тема 1.2: …" → "…").
    pub keywords: Vec<String>,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Generated page layout and naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagesConfig {
    /// Primary page file name inside every node directory (and at the root).
    pub index_file: String,
    /// Companion Q&A page file name.
    pub qa_file: String,
    /// Layout for section pages.
    pub layout: String,
    /// Layout for the root index page.
    pub home_layout: String,
    /// Title of the root index page.
    pub home_title: String,
    /// Heading on the root index page.
    pub home_heading: String,
    /// Body line written until the filler supplies real text.
    pub placeholder: String,
    /// Minimum node level that also gets a Q&A page.
    pub qa_min_level: usize,
    /// Prefix titles with their dotted number.
    pub numbered_titles: bool,
    /// Link text on a primary page pointing at its Q&A page.
    pub qa_link_label: String,
    /// Link text on a Q&A page pointing back at its primary page.
    pub back_link_label: String,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            index_file: "index.md".to_string(),
            qa_file: "qa.md".to_string(),
            layout: "default".to_string(),
            home_layout: "home".to_string(),
            home_title: "Home".to_string(),
            home_heading: "Welcome to the Documentation".to_string(),
            placeholder: "This is a placeholder for the content.".to_string(),
            qa_min_level: 3,
            numbered_titles: true,
            qa_link_label: "Go to Q&A".to_string(),
            back_link_label: "Back to theory".to_string(),
        }
    }
}

/// Content filler and queue settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FillerConfig {
    /// Shell command that turns a prompt on stdin into page text on stdout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Directory holding one system prompt per content kind (`section.md`, …).
    pub prompts_dir: String,
    /// Pages waiting to be filled, one path per line.
    pub queue_file: String,
    /// Pages that failed, appended one per line.
    pub fail_log: String,
    /// Maximum characters of the primary page passed as Q&A context.
    pub summary_limit: usize,
}

impl Default for FillerConfig {
    fn default() -> Self {
        Self {
            command: None,
            prompts_dir: "prompt".to_string(),
            queue_file: "files_to_process.txt".to_string(),
            fail_log: "fail_process.txt".to_string(),
            summary_limit: 4000,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value. `Ok(None)` if it doesn't exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when absent.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    if overlay.is_some() {
        tracing::info!(path = %path.display(), "loaded config");
    }
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `outline-site.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# outline-site configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Outline parsing
# ---------------------------------------------------------------------------
[outline]
# Section-label words removed from titles, case-insensitive, whole word:
#   "1.2 Тема 1.2: Змінні" -> "Змінні"
# They may also precede the number: "Topic 2.1 Networking".
keywords = ["Тема", "Розділ", "Частина", "Підтема", "Topic", "Part", "Section", "Chapter"]

# ---------------------------------------------------------------------------
# Generated pages
# ---------------------------------------------------------------------------
[pages]
# Page file written in every section directory and at the output root.
index_file = "index.md"

# Companion Q&A page written next to index_file for deep sections.
qa_file = "qa.md"

# Front matter layouts.
layout = "default"
home_layout = "home"

# Root index page.
home_title = "Home"
home_heading = "Welcome to the Documentation"

# Body text until `fill` replaces it.
placeholder = "This is a placeholder for the content."

# Sections at this depth or deeper also get a Q&A page (1 = top level).
qa_min_level = 3

# Prefix titles with their number ("1.2 Basics"). Keeps titles unique,
# which navigation themes need to resolve `parent:` references.
numbered_titles = true

# Cross-link labels between a page and its Q&A page.
qa_link_label = "Go to Q&A"
back_link_label = "Back to theory"

# ---------------------------------------------------------------------------
# Content filler
# ---------------------------------------------------------------------------
[filler]
# Shell command run once per page. Receives the prompt on stdin, and
# OUTLINE_SITE_KIND / OUTLINE_SITE_SYSTEM_PROMPT in the environment.
# Must print the page body on stdout. Required by `outline-site fill`.
# command = "llm -m gemini-1.5-flash"

# One system prompt per kind: section.md, overview.md, topic.md, qa.md
prompts_dir = "prompt"

# Queue of pages to fill (one path per line, `#` comments allowed).
# This and fail_log are relative to the output directory; prompts_dir is
# relative to this file.
queue_file = "files_to_process.txt"

# Pages that could not be filled are appended here.
fail_log = "fail_process.txt"

# Characters of the theory page passed as context for its Q&A page.
summary_limit = 4000
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = SiteConfig::default();
        assert_eq!(config.pages.index_file, "index.md");
        assert_eq!(config.pages.qa_file, "qa.md");
        assert_eq!(config.pages.qa_min_level, 3);
        assert!(config.pages.numbered_titles);
        assert!(config.filler.command.is_none());
        assert!(config.outline.keywords.contains(&"Тема".to_string()));
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[pages]
qa_min_level = 2
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.pages.qa_min_level, 2);
        assert_eq!(config.pages.layout, "default");
        assert_eq!(config.filler.summary_limit, 4000);
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("outline-site.toml")).unwrap();
        assert_eq!(config.pages.home_title, "Home");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("outline-site.toml");
        fs::write(
            &path,
            r#"
[outline]
keywords = ["Lesson"]

[filler]
command = "cat"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.outline.keywords, vec!["Lesson".to_string()]);
        assert_eq!(config.filler.command.as_deref(), Some("cat"));
        assert_eq!(config.filler.queue_file, "files_to_process.txt");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("outline-site.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let toml = r#"
[pages]
qa_level = 2
"#;
        let result: Result<SiteConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let toml = "[colors]\nbackground = \"#fff\"\n";
        let result: Result<SiteConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_key_rejected_via_load_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("outline-site.toml");
        fs::write(&path, "[filler]\ncomand = \"cat\"\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_keeps_sibling_keys_in_nested_tables() {
        let overlay: toml::Value = toml::from_str("[pages]\nqa_file = \"faq.md\"").unwrap();
        let merged = merge_toml(stock_defaults_value(), overlay);
        let config: SiteConfig = merged.try_into().unwrap();
        assert_eq!(config.pages.qa_file, "faq.md");
        assert_eq!(config.pages.index_file, "index.md");
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_qa_min_level_zero() {
        let mut config = SiteConfig::default();
        config.pages.qa_min_level = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_page_file_names() {
        for bad in ["", "../index.md", "sub/index.md", "index.html", ".md"] {
            let mut config = SiteConfig::default();
            config.pages.index_file = bad.to_string();
            assert!(config.validate().is_err(), "{bad:?} accepted");
        }
    }

    #[test]
    fn validate_same_index_and_qa_file() {
        let mut config = SiteConfig::default();
        config.pages.qa_file = "index.md".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn stock_config_toml_matches_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        let default = SiteConfig::default();
        assert_eq!(config.outline.keywords, default.outline.keywords);
        assert_eq!(config.pages.qa_min_level, default.pages.qa_min_level);
        assert_eq!(config.pages.placeholder, default.pages.placeholder);
        assert_eq!(config.filler.prompts_dir, default.filler.prompts_dir);
        assert!(config.validate().is_ok());
    }
}
