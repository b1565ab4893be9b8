//! Page documents: YAML front matter followed by a markdown body.
//!
//! Every generated file has the shape
//!
//! ```text
//! ---
//! layout: default
//! title: 1.1 Basics
//! parent: 1 Intro
//! nav_order: 1
//! has_children: false
//! ---
//!
//! # 1.1 Basics
//!
//! This is a placeholder for the content.
//! ```
//!
//! The front matter is consumed by the static-site theme's navigation; the
//! body is a placeholder until the filler rewrites it. Both the materializer
//! (writing) and the queue driver (read-modify-write) go through this module.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DELIMITER: &str = "---";

/// Separator placed before cross-links appended to a body.
pub(crate) const LINK_RULE: &str = "* * *";

#[derive(Error, Debug)]
pub enum PageError {
    #[error("missing front matter block")]
    MissingFrontMatter,
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Navigation metadata at the top of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    pub layout: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grand_parent: Option<String>,
    pub nav_order: u32,
    #[serde(default)]
    pub has_children: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_exclude: Option<bool>,
}

/// A parsed page: metadata plus everything after the closing delimiter.
#[derive(Debug, Clone, PartialEq)]
pub struct PageDocument {
    pub front_matter: FrontMatter,
    pub body: String,
}

impl PageDocument {
    pub fn new(front_matter: FrontMatter, body: impl Into<String>) -> Self {
        Self {
            front_matter,
            body: body.into(),
        }
    }

    /// Serialize to file contents.
    pub fn render(&self) -> Result<String, PageError> {
        let yaml = serde_yaml::to_string(&self.front_matter)?;
        Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n\n{}", self.body))
    }

    /// Parse file contents produced by [`render`](Self::render) (or by hand).
    pub fn parse(content: &str) -> Result<Self, PageError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let rest = content
            .strip_prefix(DELIMITER)
            .and_then(|r| r.strip_prefix('\n').or_else(|| r.strip_prefix("\r\n")))
            .ok_or(PageError::MissingFrontMatter)?;

        let (yaml, body) = split_at_closing_delimiter(rest).ok_or(PageError::MissingFrontMatter)?;
        let front_matter: FrontMatter = serde_yaml::from_str(yaml)?;
        Ok(Self {
            front_matter,
            body: body.trim_start_matches(['\r', '\n']).to_string(),
        })
    }
}

/// Split at the first line consisting solely of `---`.
fn split_at_closing_delimiter(rest: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Placeholder body: a heading with the page title and one line of text.
pub fn placeholder_body(title: &str, text: &str) -> String {
    format!("# {title}\n\n{text}\n")
}

/// Append a horizontal rule and a relative link to `body`.
pub fn with_link(body: &str, label: &str, target: &str) -> String {
    format!("{}\n\n{LINK_RULE}\n\n[{label}](./{target})\n", body.trim_end())
}
