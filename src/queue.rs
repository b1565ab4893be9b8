//! Resumable queue of pages waiting for text.
//!
//! The queue is a plain text file, one page path per line, relative to the
//! site root:
//!
//! ```text
//! # written by `outline-site build --enqueue`
//! 1-vstup/index.md
//! 1-vstup/1_1-osnovy/index.md
//! 1-vstup/1_1-osnovy/1_1_1-zminni/index.md
//! 1-vstup/1_1-osnovy/1_1_1-zminni/qa.md
//! ```
//!
//! Blank lines and `#` comments are ignored. [`run_queue`] takes items from
//! the front, fills each page, and rewrites the queue file with what is left
//! after every item, so an interrupted run resumes where it stopped.
//!
//! ## Per-item Flow
//!
//! 1. Read the page and its front matter.
//! 2. Pick the [`FillKind`]: the Q&A file name means `qa`; otherwise level
//!    (from the dotted number) and `has_children`.
//! 3. Gather context from disk: child page titles in navigation order, or
//!    for Q&A the primary page text, cut to `summary_limit` characters.
//! 4. Ask the filler, append the cross-link, rewrite the page with its
//!    original front matter.
//!
//! A failed item is logged, appended to the fail log, and skipped. Only
//! trouble with the queue file itself stops the run.

use crate::config::SiteConfig;
use crate::fill::{ContentFiller, FillError, FillKind, FillRequest};
use crate::materialize::write_atomic;
use crate::page::{LINK_RULE, PageDocument, PageError, with_link};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("queue file {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// Why a single page could not be filled.
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("not a path inside the site: {0}")]
    InvalidPath(String),
    #[error("page not found: {}", .0.display())]
    Missing(PathBuf),
    #[error("cannot read or write page: {0}")]
    Io(#[from] io::Error),
    #[error("malformed page: {0}")]
    Page(#[from] PageError),
    #[error("cannot determine section number from {0:?}")]
    NoNumber(String),
    #[error("filler failed: {0}")]
    Fill(#[from] FillError),
}

/// Progress of a queue run, one event per item.
#[derive(Debug, Clone)]
pub enum QueueEvent {
    Filled {
        item: String,
        kind: FillKind,
        title: String,
    },
    Failed {
        item: String,
        reason: String,
    },
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct QueueSummary {
    pub succeeded: usize,
    /// Failed items with the reason, in processing order.
    pub failed: Vec<(String, String)>,
}

/// Read queued items. A missing queue file is an empty queue.
pub fn read_queue(queue_file: &Path) -> Result<Vec<String>, QueueError> {
    let content = match fs::read_to_string(queue_file) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(QueueError::Io {
                path: queue_file.to_path_buf(),
                source,
            });
        }
    };
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| l.trim_start_matches('/').to_string())
        .collect())
}

/// Replace the queue with `items`.
pub fn enqueue(queue_file: &Path, items: &[String]) -> Result<(), QueueError> {
    let mut content = String::new();
    for item in items {
        content.push_str(item);
        content.push('\n');
    }
    write_atomic(queue_file, &content).map_err(|source| QueueError::Io {
        path: queue_file.to_path_buf(),
        source,
    })
}

/// Fill every queued page under `site_root`.
pub fn run_queue(
    site_root: &Path,
    queue_file: &Path,
    fail_log: &Path,
    filler: &dyn ContentFiller,
    config: &SiteConfig,
    progress: Option<Sender<QueueEvent>>,
) -> Result<QueueSummary, QueueError> {
    let mut remaining = read_queue(queue_file)?;
    let mut summary = QueueSummary::default();
    if remaining.is_empty() {
        info!(queue = %queue_file.display(), "queue is empty");
        return Ok(summary);
    }
    info!(items = remaining.len(), "processing queue");

    while !remaining.is_empty() {
        let item = remaining.remove(0);
        let event = match fill_page(site_root, &item, filler, config) {
            Ok((kind, title)) => {
                summary.succeeded += 1;
                debug!(item = %item, %kind, "filled page");
                QueueEvent::Filled {
                    item: item.clone(),
                    kind,
                    title,
                }
            }
            Err(e) => {
                warn!(item = %item, error = %e, "failed to fill page");
                append_failure(fail_log, &item)?;
                summary.failed.push((item.clone(), e.to_string()));
                QueueEvent::Failed {
                    item: item.clone(),
                    reason: e.to_string(),
                }
            }
        };
        enqueue(queue_file, &remaining)?;
        if let Some(tx) = &progress {
            let _ = tx.send(event);
        }
    }

    info!(
        succeeded = summary.succeeded,
        failed = summary.failed.len(),
        "queue finished"
    );
    Ok(summary)
}

fn append_failure(fail_log: &Path, item: &str) -> Result<(), QueueError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(fail_log)
        .and_then(|mut f| writeln!(f, "{item}"))
        .map_err(|source| QueueError::Io {
            path: fail_log.to_path_buf(),
            source,
        })
}

/// Fill one page in place, returning its kind and display title.
fn fill_page(
    site_root: &Path,
    item: &str,
    filler: &dyn ContentFiller,
    config: &SiteConfig,
) -> Result<(FillKind, String), ItemError> {
    let pages = &config.pages;
    let rel = Path::new(item);
    if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
        return Err(ItemError::InvalidPath(item.to_string()));
    }
    let path = site_root.join(rel);
    if !path.is_file() {
        return Err(ItemError::Missing(path));
    }
    let dir = path.parent().unwrap_or(site_root);
    let is_qa = path.file_name().is_some_and(|n| n == pages.qa_file.as_str());

    let mut doc = PageDocument::parse(&fs::read_to_string(&path)?)?;
    let fm = &doc.front_matter;
    let (title_number, bare_title) = split_number(&fm.title);
    let (number, title) = match (dir_number(dir), title_number) {
        (Some(n), Some(t)) if n == t => (n, bare_title),
        (Some(n), _) => (n, fm.title.trim()),
        (None, Some(t)) => (t.to_string(), bare_title),
        (None, None) => return Err(ItemError::NoNumber(fm.title.clone())),
    };

    let request = if is_qa {
        let title = strip_qa_prefix(title);
        FillRequest {
            kind: FillKind::Qa,
            number,
            title: title.to_string(),
            parent_title: fm.parent.clone(),
            related: primary_summary(&dir.join(&pages.index_file), config.filler.summary_limit),
        }
    } else {
        let level = number.split('.').count();
        let kind = FillKind::for_page(level, fm.has_children);
        let related = match kind {
            FillKind::Topic => String::new(),
            _ => child_titles(dir, &pages.index_file).join(", "),
        };
        FillRequest {
            kind,
            number,
            title: title.to_string(),
            parent_title: fm.parent.clone(),
            related,
        }
    };

    let text = filler.fill(&request)?;
    doc.body = if is_qa {
        with_link(&text, &pages.back_link_label, &pages.index_file)
    } else if dir.join(&pages.qa_file).is_file() {
        with_link(&text, &pages.qa_link_label, &pages.qa_file)
    } else {
        text
    };
    write_atomic(&path, &doc.render()?)?;
    Ok((request.kind, doc.front_matter.title))
}

/// Split `"1.2.3 Title"` into `(Some("1.2.3"), "Title")`.
fn split_number(title: &str) -> (Option<&str>, &str) {
    let title = title.trim();
    let end = title
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(title.len());
    let candidate = title[..end].trim_end_matches('.');
    let at_boundary = title[end..].chars().next().is_none_or(char::is_whitespace);
    if candidate.is_empty() || !at_boundary || candidate.split('.').any(str::is_empty) {
        return (None, title);
    }
    (Some(candidate), title[end..].trim_start())
}

fn strip_qa_prefix(title: &str) -> &str {
    title
        .strip_prefix("Q&A")
        .map(|rest| rest.trim_start_matches(':').trim_start())
        .unwrap_or(title)
}

/// Dotted number from a section directory name: `1_2-osnovy` → `1.2`.
fn dir_number(dir: &Path) -> Option<String> {
    let name = dir.file_name()?.to_str()?;
    let prefix = name.split_once('-').map_or(name, |(p, _)| p);
    let parts: Vec<&str> = prefix.split('_').collect();
    if parts.iter().all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit())) {
        Some(parts.join("."))
    } else {
        None
    }
}

/// Titles of the child sections of `dir`, in navigation order.
fn child_titles(dir: &Path, index_file: &str) -> Vec<String> {
    let mut children: Vec<(u32, String, String)> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .filter_map(|e| {
            let content = fs::read_to_string(e.path().join(index_file)).ok()?;
            let page = PageDocument::parse(&content).ok()?;
            Some((
                page.front_matter.nav_order,
                e.file_name().to_string_lossy().into_owned(),
                page.front_matter.title,
            ))
        })
        .collect();
    children.sort();
    children.into_iter().map(|(_, _, title)| title).collect()
}

/// Body of the primary page without its cross-link, cut to `limit` characters.
fn primary_summary(primary: &Path, limit: usize) -> String {
    let Some(page) = fs::read_to_string(primary)
        .ok()
        .and_then(|c| PageDocument::parse(&c).ok())
    else {
        return String::new();
    };
    let body = match page.body.rfind(&format!("\n{LINK_RULE}\n")) {
        Some(pos) => &page.body[..pos],
        None => page.body.as_str(),
    };
    body.trim().chars().take(limit).collect()
}
