//! Page text generation.
//!
//! Generated pages start with placeholder bodies. A [`ContentFiller`] turns a
//! [`FillRequest`] (what kind of page, its title, surrounding context) into
//! real markdown. The queue driver in [`crate::queue`] decides which pages to
//! fill and writes the results back.
//!
//! ## Kinds
//!
//! | Kind | Page | Context |
//! |------|------|---------|
//! | `section` | has children, level 1-2 | child titles |
//! | `overview` | has children, level 3+ | child titles |
//! | `topic` | leaf | parent title |
//! | `qa` | companion Q&A page | primary page text |
//!
//! ## External Commands
//!
//! [`CommandFiller`] delegates to any program that reads a prompt on stdin
//! and prints page text on stdout, so the model and vendor stay outside this
//! crate. The command runs through `sh -c` with two environment variables:
//!
//! ```text
//! OUTLINE_SITE_KIND=topic
//! OUTLINE_SITE_SYSTEM_PROMPT=prompt/topic.md
//! ```

use crate::config::FillerConfig;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;
use tracing::debug;

pub const KIND_ENV: &str = "OUTLINE_SITE_KIND";
pub const SYSTEM_PROMPT_ENV: &str = "OUTLINE_SITE_SYSTEM_PROMPT";

#[derive(Error, Debug)]
pub enum FillError {
    #[error("no filler command configured (set filler.command)")]
    NotConfigured,
    #[error("system prompt not found: {}", .0.display())]
    MissingPrompt(PathBuf),
    #[error("failed to run filler command: {0}")]
    Spawn(#[source] io::Error),
    #[error("filler command exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
    #[error("filler output is not UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error("filler returned an empty response")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillKind {
    Section,
    Overview,
    Topic,
    Qa,
}

impl FillKind {
    pub const ALL: [FillKind; 4] = [Self::Section, Self::Overview, Self::Topic, Self::Qa];

    /// Kind of a primary page at `level` (1 = top level).
    pub fn for_page(level: usize, has_children: bool) -> Self {
        match (has_children, level) {
            (true, 0..=2) => Self::Section,
            (true, _) => Self::Overview,
            (false, _) => Self::Topic,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::Overview => "overview",
            Self::Topic => "topic",
            Self::Qa => "qa",
        }
    }
}

impl std::fmt::Display for FillKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a filler gets to know about one page.
#[derive(Debug, Clone, PartialEq)]
pub struct FillRequest {
    pub kind: FillKind,
    /// Dotted number, e.g. `1.2.3`.
    pub number: String,
    /// Title without its number.
    pub title: String,
    pub parent_title: Option<String>,
    /// Child titles (sections, overviews) or primary page text (Q&A).
    pub related: String,
}

impl FillRequest {
    /// The per-page prompt. The per-kind system prompt is supplied separately.
    pub fn user_prompt(&self) -> String {
        let related = if self.related.trim().is_empty() {
            "none"
        } else {
            self.related.trim()
        };
        match self.kind {
            FillKind::Section => format!(
                "Write a very short overview (one paragraph) for the major section \"{} {}\".\n\
                 Its main subsections are: {related}.",
                self.number, self.title
            ),
            FillKind::Overview => format!(
                "Write an introductory text (2-4 paragraphs) for the section \"{} {}\".\n\
                 Explain why this topic matters and briefly introduce its subtopics: {related}.",
                self.number, self.title
            ),
            FillKind::Topic => format!(
                "[TOPIC_NUMBER]: \"{}\"\n[TOPIC_TITLE]: \"{}\"\n[PARENT_TOPIC_TITLE]: \"{}\"",
                self.number,
                self.title,
                self.parent_title.as_deref().unwrap_or("N/A")
            ),
            FillKind::Qa => format!(
                "[TOPIC_TITLE]: \"{}\"\n[RELATED_SUMMARY]: \"{related}\"",
                self.title
            ),
        }
    }
}

/// Produces page text for a request.
pub trait ContentFiller {
    fn fill(&self, request: &FillRequest) -> Result<String, FillError>;
}

/// Runs an external command once per page.
#[derive(Debug, Clone)]
pub struct CommandFiller {
    command: String,
    prompts_dir: PathBuf,
}

impl CommandFiller {
    pub fn new(command: impl Into<String>, prompts_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            prompts_dir: prompts_dir.into(),
        }
    }

    /// Build from config, resolving `prompts_dir` against `base`.
    ///
    /// Fails when the command is unset or any system prompt file is missing.
    pub fn from_config(config: &FillerConfig, base: &Path) -> Result<Self, FillError> {
        let command = config
            .command
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or(FillError::NotConfigured)?;
        let filler = Self::new(command, base.join(&config.prompts_dir));
        for kind in FillKind::ALL {
            let prompt = filler.system_prompt_path(kind);
            if !prompt.is_file() {
                return Err(FillError::MissingPrompt(prompt));
            }
        }
        Ok(filler)
    }

    pub fn system_prompt_path(&self, kind: FillKind) -> PathBuf {
        self.prompts_dir.join(format!("{}.md", kind.name()))
    }
}

impl ContentFiller for CommandFiller {
    fn fill(&self, request: &FillRequest) -> Result<String, FillError> {
        debug!(kind = %request.kind, number = %request.number, "running filler command");
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .env(KIND_ENV, request.kind.name())
            .env(SYSTEM_PROMPT_ENV, self.system_prompt_path(request.kind))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(FillError::Spawn)?;

        // The command may fill stdout before it drains stdin.
        let prompt = request.user_prompt();
        let writer = child.stdin.take().map(|mut stdin| {
            std::thread::spawn(move || {
                // Commands that ignore stdin close the pipe early.
                let _ = stdin.write_all(prompt.as_bytes());
            })
        });
        let output = child.wait_with_output().map_err(FillError::Spawn)?;
        if let Some(writer) = writer {
            let _ = writer.join();
        }

        if !output.status.success() {
            return Err(FillError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let text = String::from_utf8(output.stdout)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(FillError::Empty);
        }
        Ok(format!("{text}\n"))
    }
}

/// Deterministic filler that needs no external program.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderFiller;

impl ContentFiller for PlaceholderFiller {
    fn fill(&self, request: &FillRequest) -> Result<String, FillError> {
        Ok(format!(
            "# {} {}\n\nDraft {} text.\n",
            request.number, request.title, request.kind
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn request(kind: FillKind) -> FillRequest {
        FillRequest {
            kind,
            number: "1.2".to_string(),
            title: "Змінні".to_string(),
            parent_title: Some("Основи".to_string()),
            related: "Типи, Області видимості".to_string(),
        }
    }

    fn prompts(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        for kind in FillKind::ALL {
            fs::write(dir.join(format!("{}.md", kind.name())), "system").unwrap();
        }
    }

    #[test]
    fn kind_for_page() {
        assert_eq!(FillKind::for_page(1, true), FillKind::Section);
        assert_eq!(FillKind::for_page(2, true), FillKind::Section);
        assert_eq!(FillKind::for_page(3, true), FillKind::Overview);
        assert_eq!(FillKind::for_page(1, false), FillKind::Topic);
        assert_eq!(FillKind::for_page(5, false), FillKind::Topic);
    }

    #[test]
    fn section_prompt_lists_children() {
        let prompt = request(FillKind::Section).user_prompt();
        assert!(prompt.contains("\"1.2 Змінні\""));
        assert!(prompt.contains("Типи, Області видимості"));
    }

    #[test]
    fn empty_related_reads_none() {
        let mut req = request(FillKind::Overview);
        req.related = "  ".to_string();
        assert!(req.user_prompt().ends_with("subtopics: none."));
    }

    #[test]
    fn topic_prompt_carries_parent() {
        let prompt = request(FillKind::Topic).user_prompt();
        assert_eq!(
            prompt,
            "[TOPIC_NUMBER]: \"1.2\"\n[TOPIC_TITLE]: \"Змінні\"\n[PARENT_TOPIC_TITLE]: \"Основи\""
        );
        let mut orphan = request(FillKind::Topic);
        orphan.parent_title = None;
        assert!(orphan.user_prompt().ends_with("\"N/A\""));
    }

    #[test]
    fn qa_prompt_carries_summary() {
        let prompt = request(FillKind::Qa).user_prompt();
        assert!(prompt.starts_with("[TOPIC_TITLE]: \"Змінні\""));
        assert!(prompt.contains("[RELATED_SUMMARY]: \"Типи, Області видимості\""));
    }

    #[test]
    fn placeholder_filler_is_deterministic() {
        let req = request(FillKind::Topic);
        let a = PlaceholderFiller.fill(&req).unwrap();
        let b = PlaceholderFiller.fill(&req).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "# 1.2 Змінні\n\nDraft topic text.\n");
    }

    #[test]
    fn from_config_requires_command() {
        let tmp = TempDir::new().unwrap();
        let err = CommandFiller::from_config(&FillerConfig::default(), tmp.path()).unwrap_err();
        assert!(matches!(err, FillError::NotConfigured));
    }

    #[test]
    fn from_config_requires_prompt_files() {
        let tmp = TempDir::new().unwrap();
        let config = FillerConfig {
            command: Some("cat".to_string()),
            ..FillerConfig::default()
        };
        let err = CommandFiller::from_config(&config, tmp.path()).unwrap_err();
        assert!(matches!(err, FillError::MissingPrompt(_)));

        prompts(&tmp.path().join("prompt"));
        assert!(CommandFiller::from_config(&config, tmp.path()).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn command_receives_prompt_and_environment() {
        let tmp = TempDir::new().unwrap();
        let filler = CommandFiller::new(
            "printf '%s|%s|' \"$OUTLINE_SITE_KIND\" \"$(basename \"$OUTLINE_SITE_SYSTEM_PROMPT\")\"; cat",
            tmp.path(),
        );
        let text = filler.fill(&request(FillKind::Topic)).unwrap();
        assert!(text.starts_with("topic|topic.md|[TOPIC_NUMBER]: \"1.2\""));
        assert!(text.ends_with("\"Основи\"\n"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_is_error() {
        let filler = CommandFiller::new("echo boom >&2; exit 3", "prompt");
        match filler.fill(&request(FillKind::Topic)).unwrap_err() {
            FillError::Failed { status, stderr } => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn empty_output_is_error() {
        let filler = CommandFiller::new("printf '  \\n'", "prompt");
        assert!(matches!(
            filler.fill(&request(FillKind::Qa)),
            Err(FillError::Empty)
        ));
    }
}
