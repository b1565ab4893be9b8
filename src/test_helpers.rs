//! Shared test utilities for the outline-site test suite.
//!
//! Provides parsing shortcuts, node lookups, page readers, and tree shape
//! assertions that work with parsed outlines and generated pages.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let outline = parse_ok("1 Intro\n1.1 Basics\n2 Topics");
//!
//! let basics = find_node(&outline, "1.1");
//! assert_eq!(basics.slug, "1_1-basics");
//!
//! assert_tree_shape(&outline, &[
//!     ("Intro", &["Basics"]),
//!     ("Topics", &[]),
//! ]);
//! ```

use std::path::Path;

use crate::outline::{NodePath, Outline, OutlineNode, parse};
use crate::page::PageDocument;

// =========================================================================
// Parsing
// =========================================================================

/// Parse with stock keywords and assert there were no warnings.
pub fn parse_ok(text: &str) -> Outline {
    let report = parse(text);
    assert!(
        report.warnings.is_empty(),
        "unexpected parse warnings: {:?}",
        report.warnings
    );
    report.outline
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find a node by dotted path. Panics if not found.
pub fn find_node<'a>(outline: &'a Outline, dotted: &str) -> &'a OutlineNode {
    let path = NodePath::parse(dotted).unwrap_or_else(|| panic!("invalid path '{dotted}'"));
    outline.find(&path).unwrap_or_else(|| {
        let paths: Vec<String> = outline.nodes().iter().map(|n| n.path.dotted()).collect();
        panic!("node '{dotted}' not found. Available: {paths:?}")
    })
}

/// Read and parse a generated page. Panics on any failure.
pub fn read_page(path: &Path) -> PageDocument {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    PageDocument::parse(&content)
        .unwrap_or_else(|e| panic!("cannot parse {}: {e}", path.display()))
}

// =========================================================================
// Tree helpers
// =========================================================================

/// Top-level titles in order.
pub fn top_titles(outline: &Outline) -> Vec<&str> {
    outline.children.iter().map(|n| n.title.as_str()).collect()
}

/// Assert that the top two levels of the tree match an expected shape.
///
/// Each entry is `(title, children)`. Use `&[]` for leaf nodes.
///
/// ```rust
/// assert_tree_shape(&outline, &[
///     ("Intro", &["Basics", "Advanced"]),
///     ("Topics", &[]),
/// ]);
/// ```
pub fn assert_tree_shape(outline: &Outline, expected: &[(&str, &[&str])]) {
    let expected_titles: Vec<&str> = expected.iter().map(|(t, _)| *t).collect();
    assert_eq!(top_titles(outline), expected_titles, "top-level titles mismatch");

    for ((title, children), node) in expected.iter().zip(&outline.children) {
        let actual: Vec<&str> = node.children.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(actual, children.to_vec(), "children of '{title}' mismatch");
    }
}
