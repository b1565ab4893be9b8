//! Removal of output left over from a previous build.
//!
//! Only depth-1 section directories are removed: everything deeper lives
//! inside one of them and is recreated with it. The previous home page and
//! generation record go too, so a shrunk outline never leaves orphaned pages.
//!
//! ## Guards
//!
//! Candidates come from a record on disk, so each one is checked before
//! anything is deleted:
//! - it must be a single plain path component (no `..`, no separators)
//! - it must not be, or contain, the outline file being compiled
//!
//! A failed guard is not an error. The path is logged, reported in
//! [`CleanReport::refused`], and left alone.

use crate::manifest::MANIFEST_FILENAME;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("cannot remove {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    /// The name would escape the output root or address a nested path.
    NotAPlainName,
    /// Deleting it would delete the outline source.
    ContainsOutline,
}

#[derive(Debug, Default)]
pub struct CleanReport {
    pub removed: Vec<PathBuf>,
    pub refused: Vec<(PathBuf, Refusal)>,
}

/// Remove the previous build's top-level sections, home page, and record.
///
/// `previous_top_level` lists the slugs of the previous build's depth-1
/// directories. Missing entries are skipped silently.
pub fn clean(
    output_root: &Path,
    previous_top_level: &[String],
    outline_path: &Path,
    index_file: &str,
) -> Result<CleanReport, CleanError> {
    let mut report = CleanReport::default();
    let outline = resolve(outline_path);

    for slug in previous_top_level {
        let target = output_root.join(slug);
        if !is_plain_name(slug) {
            refuse(&mut report, target, Refusal::NotAPlainName);
            continue;
        }
        let Ok(meta) = fs::symlink_metadata(&target) else {
            continue;
        };
        if resolve(&target) == outline || outline.starts_with(resolve(&target)) {
            refuse(&mut report, target, Refusal::ContainsOutline);
            continue;
        }

        let result = if meta.is_dir() {
            fs::remove_dir_all(&target)
        } else if meta.file_type().is_symlink() {
            fs::remove_file(&target)
        } else {
            debug!(path = %target.display(), "not a directory, leaving in place");
            continue;
        };
        result.map_err(|source| CleanError::Io {
            path: target.clone(),
            source,
        })?;
        debug!(path = %target.display(), "removed section directory");
        report.removed.push(target);
    }

    for name in [index_file, MANIFEST_FILENAME] {
        let target = output_root.join(name);
        if !target.is_file() {
            continue;
        }
        if resolve(&target) == outline {
            refuse(&mut report, target, Refusal::ContainsOutline);
            continue;
        }
        fs::remove_file(&target).map_err(|source| CleanError::Io {
            path: target.clone(),
            source,
        })?;
        report.removed.push(target);
    }

    info!(
        removed = report.removed.len(),
        refused = report.refused.len(),
        "cleaned previous output"
    );
    Ok(report)
}

fn refuse(report: &mut CleanReport, target: PathBuf, reason: Refusal) {
    warn!(path = %target.display(), ?reason, "refusing to delete");
    report.refused.push((target, reason));
}

fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Canonical form when the path exists, otherwise the path made absolute.
pub(crate) fn resolve(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
