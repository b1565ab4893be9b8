//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Every section is shown by its semantic identity (navigation position and
//! title) first, with files as secondary context. The tree reads as a table
//! of contents; the `→` column or indented `Source:` lines trace each entry
//! back to disk.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Outline
//! 001 1 Вступ
//!     Source: line 1 → 1-vstup/
//!     001 1.1 Основи
//!         Source: line 2 → 1_1-osnovy/
//!
//! Warnings
//!     line 7: 1.1 already defined on line 2, skipping "1.1 Again"
//! ```
//!
//! ## Build
//!
//! ```text
//! Home → index.md
//! 001 1 Вступ → 1-vstup/index.md
//!     001 1.1 Основи → 1-vstup/1_1-osnovy/index.md
//!         001 1.1.1 Змінні → 1-vstup/1_1-osnovy/1_1_1-zminni/index.md
//!             Q&A → 1-vstup/1_1-osnovy/1_1_1-zminni/qa.md
//!
//! Generated 3 sections, 1 Q&A page
//! ```
//!
//! ## Fill
//!
//! ```text
//! topic 1-vstup/index.md
//! FAILED 2-praktyka/index.md: filler failed: filler returned an empty response
//!
//! Filled 1 page, 1 failed
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::clean::{CleanReport, Refusal};
use crate::compile::Freshness;
use crate::materialize::{MaterializeReport, PageKind};
use crate::outline::{Outline, OutlineNode, ParseWarning};
use crate::queue::{QueueEvent, QueueSummary};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based navigation position as 3-digit zero-padded.
fn format_index(pos: u32) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 page`, `2 pages`.
fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Check: outline tree and warnings
// ============================================================================

/// Format the parsed outline as an indented tree.
pub fn format_outline(outline: &Outline, numbered: bool) -> Vec<String> {
    let mut lines = vec!["Outline".to_string()];
    if outline.children.is_empty() {
        lines.push("    (no sections found)".to_string());
    }
    for node in &outline.children {
        outline_node_lines(node, 0, numbered, &mut lines);
    }
    lines
}

fn outline_node_lines(node: &OutlineNode, depth: usize, numbered: bool, lines: &mut Vec<String>) {
    lines.push(format!(
        "{}{} {}",
        indent(depth),
        format_index(node.nav_order),
        node.display_title(numbered)
    ));
    lines.push(format!(
        "{}Source: line {} \u{2192} {}/",
        indent(depth + 1),
        node.line,
        node.slug
    ));
    for child in &node.children {
        outline_node_lines(child, depth + 1, numbered, lines);
    }
}

/// Format parse warnings; empty when there are none.
pub fn format_warnings(warnings: &[ParseWarning]) -> Vec<String> {
    if warnings.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["Warnings".to_string()];
    for warning in warnings {
        lines.push(format!("    {}", warning));
    }
    lines
}

pub fn print_check_output(outline: &Outline, warnings: &[ParseWarning], numbered: bool) {
    for line in format_outline(outline, numbered) {
        println!("{}", line);
    }
    let warning_lines = format_warnings(warnings);
    if !warning_lines.is_empty() {
        println!();
        for line in warning_lines {
            println!("{}", line);
        }
    }
}

// ============================================================================
// Build: written pages
// ============================================================================

/// Format the pages a build wrote.
///
/// Section pages lead with their navigation position and title, followed by
/// `→` and the output path. Q&A pages hang under their section.
pub fn format_build_output(report: &MaterializeReport) -> Vec<String> {
    let mut lines = Vec::new();

    for page in &report.pages {
        let depth = page.node.as_ref().map_or(0, |n| n.level() - 1);
        match page.kind {
            PageKind::Home => lines.insert(0, format!("Home \u{2192} {}", page.path)),
            PageKind::Primary => lines.push(format!(
                "{}{} {} \u{2192} {}",
                indent(depth),
                format_index(page.nav_order),
                page.title,
                page.path
            )),
            PageKind::Qa => lines.push(format!(
                "{}Q&A \u{2192} {}",
                indent(depth + 1),
                page.path
            )),
        }
    }

    let sections = report.count(PageKind::Primary);
    let qa = report.count(PageKind::Qa);
    lines.push(String::new());
    lines.push(format!(
        "Generated {}, {}",
        plural(sections, "section"),
        plural(qa, "Q&A page")
    ));
    lines
}

pub fn print_build_output(report: &MaterializeReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Clean
// ============================================================================

/// Format cleaner results with paths relative to the output root.
pub fn format_clean_output(report: &CleanReport, output_root: &Path) -> Vec<String> {
    let rel = |p: &Path| {
        p.strip_prefix(output_root)
            .unwrap_or(p)
            .display()
            .to_string()
    };
    let mut lines = Vec::new();
    for path in &report.removed {
        lines.push(format!("Removed {}", rel(path)));
    }
    for (path, reason) in &report.refused {
        let why = match reason {
            Refusal::NotAPlainName => "not a plain directory name",
            Refusal::ContainsOutline => "contains the outline file",
        };
        lines.push(format!("Kept {} ({})", rel(path), why));
    }
    if lines.is_empty() {
        lines.push("Nothing to clean".to_string());
    }
    lines
}

pub fn print_clean_output(report: &CleanReport, output_root: &Path) {
    for line in format_clean_output(report, output_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Status
// ============================================================================

pub fn format_status(freshness: Freshness, output_root: &Path) -> String {
    let root = output_root.display();
    match freshness {
        Freshness::UpToDate => format!("{root}: up to date"),
        Freshness::Stale => format!("{root}: outline changed since last build"),
        Freshness::NeverBuilt => format!("{root}: not built yet"),
    }
}

// ============================================================================
// Fill
// ============================================================================

/// Format a single queue progress event.
pub fn format_queue_event(event: &QueueEvent) -> String {
    match event {
        QueueEvent::Filled { item, kind, .. } => format!("{kind} {item}"),
        QueueEvent::Failed { item, reason } => format!("FAILED {item}: {reason}"),
    }
}

pub fn format_queue_summary(summary: &QueueSummary) -> String {
    let mut line = format!("Filled {}", plural(summary.succeeded, "page"));
    if !summary.failed.is_empty() {
        line.push_str(&format!(", {} failed", summary.failed.len()));
    }
    line
}
