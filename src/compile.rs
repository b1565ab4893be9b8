//! The build pipeline: outline file in, page tree out.
//!
//! ```text
//! 1. Read      content.md   →  text            (missing file aborts, nothing touched)
//! 2. Parse     text         →  Outline         (+ warnings for skipped lines)
//!    Guard     outline path                    (inside a path we write? abort, nothing touched)
//! 3. Clean     previous     →  removed dirs    (top-level slugs from the last record)
//! 4. Write     Outline      →  site/           (fail-fast)
//! 5. Record    report       →  .outline-site.json
//! ```
//!
//! Each stage lives in its own module; this one only sequences them and
//! decides which top-level directories belong to the previous build.

use crate::clean::{CleanError, CleanReport, clean, resolve};
use crate::config::SiteConfig;
use crate::manifest::{GenerationManifest, MANIFEST_FILENAME};
use crate::materialize::{MaterializeError, MaterializeReport, materialize};
use crate::outline::{Outline, OutlineParser, ParseError, ParseReport, ParseWarning};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("outline file not found: {}", .0.display())]
    OutlineMissing(PathBuf),
    #[error("cannot read outline {}: {source}", .path.display())]
    OutlineRead { path: PathBuf, source: io::Error },
    #[error("outline {} is inside build output {}", .outline.display(), .target.display())]
    OutlineInOutput { outline: PathBuf, target: PathBuf },
    #[error("invalid outline settings: {0}")]
    Parse(#[from] ParseError),
    #[error("cleaning failed: {0}")]
    Clean(#[from] CleanError),
    #[error("writing pages failed: {0}")]
    Materialize(#[from] MaterializeError),
    #[error("cannot write generation record: {0}")]
    Record(#[source] io::Error),
}

/// Result of a successful build.
#[derive(Debug)]
pub struct BuildOutcome {
    pub outline: Outline,
    pub warnings: Vec<ParseWarning>,
    pub cleaned: CleanReport,
    pub written: MaterializeReport,
}

/// How the output directory relates to the current outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Built from exactly this outline text.
    UpToDate,
    /// Built, but the outline changed since.
    Stale,
    /// No generation record in the output directory.
    NeverBuilt,
}

pub fn read_outline(path: &Path) -> Result<String, CompileError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(CompileError::OutlineMissing(path.to_path_buf()))
        }
        Err(source) => Err(CompileError::OutlineRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Parse outline text with the configured keywords. The parser logs each
/// warning itself.
pub fn parse_outline(text: &str, config: &SiteConfig) -> Result<ParseReport, CompileError> {
    let parser = OutlineParser::new(&config.outline.keywords)?;
    let report = parser.parse(text);
    debug!(
        nodes = report.outline.node_count(),
        warnings = report.warnings.len(),
        "parsed outline"
    );
    Ok(report)
}

/// Top-level slugs the previous build created.
///
/// Taken from the generation record when one exists; otherwise the current
/// outline's own top-level slugs, which covers a first run over output that
/// predates the record.
pub fn previous_top_level(output_root: &Path, current: &Outline) -> Vec<String> {
    match GenerationManifest::load(output_root) {
        Some(record) => record.top_level,
        None => {
            debug!("no generation record, cleaning current top-level sections");
            current.top_level_slugs()
        }
    }
}

/// Run the whole pipeline.
pub fn build(
    outline_path: &Path,
    output_root: &Path,
    config: &SiteConfig,
) -> Result<BuildOutcome, CompileError> {
    let text = read_outline(outline_path)?;
    let ParseReport { outline, warnings } = parse_outline(&text, config)?;
    guard_outline(outline_path, output_root, &outline, config)?;

    let previous = previous_top_level(output_root, &outline);
    let cleaned = clean(
        output_root,
        &previous,
        outline_path,
        &config.pages.index_file,
    )?;

    let written = materialize(&outline, output_root, &config.pages)?;

    GenerationManifest::new(&text, written.top_level.clone(), written.page_paths())
        .save(output_root)
        .map_err(CompileError::Record)?;

    info!(
        pages = written.pages.len(),
        warnings = warnings.len(),
        output = %output_root.display(),
        "build complete"
    );
    Ok(BuildOutcome {
        outline,
        warnings,
        cleaned,
        written,
    })
}

/// Refuse to build when the outline file sits at a path the build writes:
/// the home page, the generation record, or inside a current top-level
/// section directory.
fn guard_outline(
    outline_path: &Path,
    output_root: &Path,
    outline: &Outline,
    config: &SiteConfig,
) -> Result<(), CompileError> {
    let source = resolve(outline_path);
    let root = resolve(output_root);

    let files = [config.pages.index_file.as_str(), MANIFEST_FILENAME]
        .into_iter()
        .map(|name| root.join(name))
        .filter(|target| *target == source);
    let sections = outline
        .top_level_slugs()
        .into_iter()
        .map(|slug| root.join(slug))
        .filter(|target| source.starts_with(target));

    match files.chain(sections).next() {
        Some(target) => Err(CompileError::OutlineInOutput {
            outline: outline_path.to_path_buf(),
            target,
        }),
        None => Ok(()),
    }
}

/// Remove the previous build's output without writing a new one.
///
/// An unreadable outline is not fatal here: the generation record alone is
/// enough to know what to delete.
pub fn clean_output(
    outline_path: &Path,
    output_root: &Path,
    config: &SiteConfig,
) -> Result<CleanReport, CompileError> {
    let previous = match GenerationManifest::load(output_root) {
        Some(record) => record.top_level,
        None => match read_outline(outline_path) {
            Ok(text) => parse_outline(&text, config)?.outline.top_level_slugs(),
            Err(e) => {
                warn!(error = %e, "no generation record and no outline, nothing to clean");
                Vec::new()
            }
        },
    };
    Ok(clean(
        output_root,
        &previous,
        outline_path,
        &config.pages.index_file,
    )?)
}

pub fn status(outline_path: &Path, output_root: &Path) -> Result<Freshness, CompileError> {
    let text = read_outline(outline_path)?;
    Ok(match GenerationManifest::load(output_root) {
        None => Freshness::NeverBuilt,
        Some(record) if record.matches(&text) => Freshness::UpToDate,
        Some(_) => Freshness::Stale,
    })
}
