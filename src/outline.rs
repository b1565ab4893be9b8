//! Numbered-outline parsing.
//!
//! Stage 1 of the build. Turns outline text into a validated tree of
//! [`OutlineNode`]s keyed by their dotted number path.
//!
//! ## Recognized Lines
//!
//! Only lines that start with a dotted number are significant. Markdown
//! decoration and a structural keyword may precede the number:
//!
//! ```text
//! 1 Вступ                          → [1]      "Вступ"
//! ## 1.2. Основи                   → [1, 2]   "Основи"
//! - **1.2.3 Тема 1.2.3: Змінні**   → [1,2,3]  "Змінні"
//! Topic 2.1) Networking            → [2, 1]   "Networking"
//! ```
//!
//! Everything else (blank lines, separators, prose) is ignored silently.
//!
//! ## Validation
//!
//! A recognized line is skipped with a [`ParseWarning`] when:
//! - a path component is zero or does not fit in a `u32`
//! - the title is empty once numbering, decoration, and keywords are removed
//! - the same number path was already used earlier in the outline
//! - its parent path has not appeared on an earlier line
//!
//! Skipped lines never reach the tree. Parents must precede their children;
//! the parser does not invent missing intermediate levels.

use crate::slug::slugify;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid structural keyword pattern: {0}")]
    Keyword(#[from] regex::Error),
}

/// A line that looked like an outline entry but was not turned into a node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    #[error("line {line}: invalid number path in {text:?}")]
    InvalidNumber { line: usize, text: String },
    #[error("line {line}: empty title after normalization in {text:?}")]
    EmptyTitle { line: usize, text: String },
    #[error("line {line}: {path} already defined on line {first_line}, skipping {text:?}")]
    DuplicatePath {
        line: usize,
        text: String,
        path: NodePath,
        first_line: usize,
    },
    #[error("line {line}: parent of {path} not found, skipping {text:?}")]
    UnresolvedParent {
        line: usize,
        text: String,
        path: NodePath,
    },
}

impl ParseWarning {
    /// 1-based line number of the offending line.
    pub fn line(&self) -> usize {
        match self {
            ParseWarning::InvalidNumber { line, .. }
            | ParseWarning::EmptyTitle { line, .. }
            | ParseWarning::DuplicatePath { line, .. }
            | ParseWarning::UnresolvedParent { line, .. } => *line,
        }
    }
}

/// Dotted number path identifying a node, e.g. `[1, 2, 3]` for `1.2.3`.
///
/// Dropping the last component yields the parent's path; the empty path is
/// the synthetic root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(Vec<u32>);

impl NodePath {
    /// Parse `"1.2.3"`. Returns `None` for zero or overflowing components.
    pub fn parse(dotted: &str) -> Option<Self> {
        let parts = dotted
            .split('.')
            .map(|p| p.parse::<u32>().ok().filter(|&n| n > 0))
            .collect::<Option<Vec<_>>>()?;
        if parts.is_empty() {
            return None;
        }
        Some(Self(parts))
    }

    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// Depth in the tree: 1 for top-level sections.
    pub fn level(&self) -> usize {
        self.0.len()
    }

    pub fn parent(&self) -> NodePath {
        let mut parts = self.0.clone();
        parts.pop();
        NodePath(parts)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// `1.2.3`
    pub fn dotted(&self) -> String {
        self.join(".")
    }

    /// `1_2_3`, the number part of a slug.
    pub fn slug_prefix(&self) -> String {
        self.join("_")
    }

    fn join(&self, sep: &str) -> String {
        self.0
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(sep)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

/// A content page in the outline tree. The synthetic root is [`Outline`].
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineNode {
    pub path: NodePath,
    /// The outline line as written (trimmed).
    pub raw_title: String,
    /// Title with numbering, decoration, and keywords removed. Never empty.
    pub title: String,
    /// `<path with underscores>-<encoded title>`, unique across the tree.
    pub slug: String,
    /// 1-based position among siblings, in outline order.
    pub nav_order: u32,
    /// 1-based source line.
    pub line: usize,
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    pub fn level(&self) -> usize {
        self.path.level()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Title shown in page metadata and navigation.
    ///
    /// With `numbered` set this is `"1.2 Основи"`, which keeps titles unique
    /// across the whole site.
    pub fn display_title(&self, numbered: bool) -> String {
        if numbered {
            format!("{} {}", self.path, self.title)
        } else {
            self.title.clone()
        }
    }
}

/// The synthetic root of a parsed outline. Not itself a page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outline {
    pub children: Vec<OutlineNode>,
}

impl Outline {
    /// All content nodes, parents before children, in outline order.
    pub fn nodes(&self) -> Vec<&OutlineNode> {
        let mut out = Vec::new();
        let mut stack: Vec<&OutlineNode> = self.children.iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    pub fn node_count(&self) -> usize {
        self.nodes().len()
    }

    pub fn find(&self, path: &NodePath) -> Option<&OutlineNode> {
        let mut level = &self.children;
        let mut found = None;
        for depth in 1..=path.level() {
            let prefix = &path.components()[..depth];
            let node = level.iter().find(|n| n.path.components() == prefix)?;
            level = &node.children;
            found = Some(node);
        }
        found
    }

    pub fn top_level_slugs(&self) -> Vec<String> {
        self.children.iter().map(|n| n.slug.clone()).collect()
    }
}

/// Result of a parse: the tree plus every line that was skipped.
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    pub outline: Outline,
    pub warnings: Vec<ParseWarning>,
}

/// Keywords used when no configuration is supplied.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "Тема", "Розділ", "Частина", "Підтема", "Topic", "Part", "Section", "Chapter",
];

/// Characters trimmed from both ends of a title. `#` is only trimmed at the
/// start, so names like `C#` survive.
const EDGE_PUNCTUATION: &[char] = &[
    '.', ',', ':', ';', '-', '–', '—', '>', '_', '|', '/', '\\', '=', '~',
];

/// Parses outline text. Holds only compiled patterns, so one parser can be
/// reused across independent documents.
#[derive(Debug, Clone)]
pub struct OutlineParser {
    line_re: Regex,
    keyword_re: Option<Regex>,
}

impl Default for OutlineParser {
    fn default() -> Self {
        let keywords: Vec<String> = DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect();
        // Stock keywords are plain words; escaping them cannot produce an invalid pattern.
        Self::new(&keywords).expect("stock keywords must compile")
    }
}

impl OutlineParser {
    pub fn new(keywords: &[String]) -> Result<Self, ParseError> {
        let alternation = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("|");

        let keyword_prefix = if alternation.is_empty() {
            String::new()
        } else {
            format!(r"(?:(?i:{alternation})\s*)?")
        };
        let line_re = Regex::new(&format!(
            r"^[\s#>*_+\-]*{keyword_prefix}(?P<path>\d+(?:\.\d+)*)\.?[*_]*(?:[\s:)]+(?P<rest>.*))?$"
        ))?;
        let keyword_re = if alternation.is_empty() {
            None
        } else {
            Some(Regex::new(&format!(r"^\s*(?i:{alternation})(?:[\s:.]|$)"))?)
        };

        Ok(Self {
            line_re,
            keyword_re,
        })
    }

    /// Parse outline text into a tree, collecting a warning for every
    /// recognized line that had to be skipped.
    pub fn parse(&self, text: &str) -> ParseReport {
        let mut builder = TreeBuilder::default();
        let mut warnings = Vec::new();

        for (idx, raw_line) in text.lines().enumerate() {
            let line = idx + 1;
            let Some(caps) = self.line_re.captures(raw_line) else {
                continue;
            };
            let trimmed = raw_line.trim().to_string();

            let Some(path) = NodePath::parse(&caps["path"]) else {
                warnings.push(ParseWarning::InvalidNumber {
                    line,
                    text: trimmed,
                });
                continue;
            };

            let rest = caps.name("rest").map(|m| m.as_str()).unwrap_or("");
            let title = self.clean_title(rest, &path);
            if title.is_empty() {
                warnings.push(ParseWarning::EmptyTitle {
                    line,
                    text: trimmed,
                });
                continue;
            }

            if let Some(first_line) = builder.line_of(&path) {
                warnings.push(ParseWarning::DuplicatePath {
                    line,
                    text: trimmed,
                    path,
                    first_line,
                });
                continue;
            }

            let encoded = slugify(&title);
            let slug = if encoded.is_empty() {
                path.slug_prefix()
            } else {
                format!("{}-{}", path.slug_prefix(), encoded)
            };

            let node = OutlineNode {
                path: path.clone(),
                raw_title: trimmed.clone(),
                title,
                slug,
                nav_order: 0,
                line,
                children: Vec::new(),
            };
            if !builder.insert(node) {
                warnings.push(ParseWarning::UnresolvedParent {
                    line,
                    text: trimmed,
                    path,
                });
            }
        }

        for warning in &warnings {
            warn!(line = warning.line(), "{warning}");
        }

        ParseReport {
            outline: builder.finish(),
            warnings,
        }
    }

    /// Normalize the text after the number into a display title.
    fn clean_title(&self, rest: &str, path: &NodePath) -> String {
        let mut text = rest.replace("**", "").replace("__", "");
        text.retain(|c| c != '*' && c != '`');

        if let Some(re) = &self.keyword_re {
            while let Some(m) = re.find(&text) {
                text = text[m.end()..]
                    .trim_start_matches(|c: char| c.is_whitespace() || c == ':' || c == '.')
                    .to_string();
            }
        }

        let text = strip_path_mentions(&text, &path.dotted());
        let text = text
            .trim_start_matches(|c: char| c.is_whitespace() || c == '#' || EDGE_PUNCTUATION.contains(&c))
            .trim_end_matches(|c: char| c.is_whitespace() || EDGE_PUNCTUATION.contains(&c));
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Parse with the stock keyword list.
pub fn parse(text: &str) -> ParseReport {
    OutlineParser::default().parse(text)
}

/// Remove every standalone occurrence of `dotted` (not part of a longer number).
fn strip_path_mentions(text: &str, dotted: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, _) in text.match_indices(dotted) {
        let end = start + dotted.len();
        let before = text[..start].chars().next_back();
        let mut after = text[end..].chars();
        let next = after.next();
        let next_next = after.next();

        let glued_before = before.is_some_and(|c| c.is_ascii_digit() || c == '.');
        let glued_after = next.is_some_and(|c| c.is_ascii_digit())
            || (next == Some('.') && next_next.is_some_and(|c| c.is_ascii_digit()));
        if glued_before || glued_after {
            continue;
        }
        out.push_str(&text[cursor..start]);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Arena used while parsing. Nodes are appended to their parent's child
/// list in outline order and indexed by path for parent lookup; the nested
/// tree is assembled once at the end.
#[derive(Default)]
struct TreeBuilder {
    slots: Vec<Option<Slot>>,
    roots: Vec<usize>,
    index: HashMap<NodePath, usize>,
}

struct Slot {
    node: OutlineNode,
    children: Vec<usize>,
}

impl TreeBuilder {
    fn line_of(&self, path: &NodePath) -> Option<usize> {
        let idx = *self.index.get(path)?;
        self.slots[idx].as_ref().map(|s| s.node.line)
    }

    /// Attach under the parent. Returns `false` if the parent is unknown.
    fn insert(&mut self, mut node: OutlineNode) -> bool {
        let parent = node.path.parent();
        let siblings_len = if parent.is_root() {
            self.roots.len()
        } else {
            match self.index.get(&parent).and_then(|&i| self.slots[i].as_ref()) {
                Some(slot) => slot.children.len(),
                None => return false,
            }
        };
        node.nav_order = siblings_len as u32 + 1;

        let idx = self.slots.len();
        debug!(path = %node.path, slug = %node.slug, nav_order = node.nav_order, "outline node");
        self.index.insert(node.path.clone(), idx);
        self.slots.push(Some(Slot {
            node,
            children: Vec::new(),
        }));

        if parent.is_root() {
            self.roots.push(idx);
        } else if let Some(slot) = self.index.get(&parent).and_then(|&i| self.slots[i].as_mut()) {
            slot.children.push(idx);
        }
        true
    }

    fn finish(mut self) -> Outline {
        let roots = std::mem::take(&mut self.roots);
        let children = roots.into_iter().filter_map(|i| self.take(i)).collect();
        Outline { children }
    }

    fn take(&mut self, idx: usize) -> Option<OutlineNode> {
        let Slot { mut node, children } = self.slots[idx].take()?;
        node.children = children.into_iter().filter_map(|i| self.take(i)).collect();
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    const SCENARIO: &str = "1 Intro\n1.1 Basics\n1.2 Advanced\n2 Topics\n2.1 Networking";

    #[test]
    fn scenario_tree_shape() {
        let outline = parse_ok(SCENARIO);
        assert_eq!(outline.node_count(), 5);
        assert_tree_shape(
            &outline,
            &[("Intro", &["Basics", "Advanced"]), ("Topics", &["Networking"])],
        );
    }

    #[test]
    fn nav_order_follows_insertion() {
        let outline = parse_ok(SCENARIO);
        let orders: Vec<u32> = outline.children.iter().map(|n| n.nav_order).collect();
        assert_eq!(orders, vec![1, 2]);
        let intro: Vec<u32> = outline.children[0]
            .children
            .iter()
            .map(|n| n.nav_order)
            .collect();
        assert_eq!(intro, vec![1, 2]);
    }

    #[test]
    fn nav_order_ignores_trailing_digit() {
        let outline = parse_ok("1 A\n1.5 Five\n1.2 Two");
        let five = find_node(&outline, "1.5");
        let two = find_node(&outline, "1.2");
        assert_eq!(five.nav_order, 1);
        assert_eq!(two.nav_order, 2);
    }

    #[test]
    fn slug_embeds_full_path() {
        let outline = parse_ok(SCENARIO);
        let basics = find_node(&outline, "1.1");
        assert_eq!(basics.slug, "1_1-basics");
        assert!(basics.slug.contains("1_1"));
        assert!(basics.slug.contains("basics"));
    }

    #[test]
    fn identical_titles_in_different_branches_get_distinct_slugs() {
        let outline = parse_ok("1 A\n1.1 Overview\n2 B\n2.1 Overview");
        let slugs: Vec<&str> = outline.nodes().iter().map(|n| n.slug.as_str()).collect();
        let mut unique = slugs.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), slugs.len());
        assert_eq!(find_node(&outline, "1.1").slug, "1_1-overview");
        assert_eq!(find_node(&outline, "2.1").slug, "2_1-overview");
    }

    #[test]
    fn level_increases_by_one() {
        let outline = parse_ok("1 A\n1.1 B\n1.1.1 C\n1.1.1.1 D\n2 E");
        for node in outline.nodes() {
            for child in &node.children {
                assert_eq!(child.level(), node.level() + 1);
            }
        }
        assert_eq!(find_node(&outline, "1.1.1.1").level(), 4);
    }

    #[test]
    fn unresolved_parent_is_skipped_with_warning() {
        let report = parse("3.2 Orphan\n1 Intro\n1.1 Basics");
        assert_eq!(report.outline.node_count(), 2);
        assert!(report.outline.find(&NodePath::parse("3.2").unwrap()).is_none());
        assert!(
            report
                .outline
                .nodes()
                .iter()
                .all(|n| n.title != "Orphan")
        );
        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(
            &report.warnings[0],
            ParseWarning::UnresolvedParent { line: 1, path, .. } if path.dotted() == "3.2"
        ));
    }

    #[test]
    fn missing_intermediate_level_is_not_inferred() {
        let report = parse("1 Intro\n1.1.1 Deep");
        assert_eq!(report.outline.node_count(), 1);
        assert!(!report.outline.children[0].has_children());
        assert!(matches!(
            report.warnings[0],
            ParseWarning::UnresolvedParent { line: 2, .. }
        ));
    }

    #[test]
    fn children_of_skipped_lines_are_skipped_too() {
        let report = parse("1 A\n2.1 Orphan\n2.1.1 Grandchild");
        assert_eq!(report.outline.node_count(), 1);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn empty_title_is_skipped_with_warning() {
        let report = parse("1 Intro\n1.1 **Тема 1.1:**\n1.2\n1.3 Real");
        let titles: Vec<&str> = report
            .outline
            .nodes()
            .iter()
            .map(|n| n.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Intro", "Real"]);
        assert_eq!(report.warnings.len(), 2);
        assert!(
            report
                .warnings
                .iter()
                .all(|w| matches!(w, ParseWarning::EmptyTitle { .. }))
        );
        assert_eq!(report.warnings[0].line(), 2);
        assert_eq!(report.warnings[1].line(), 3);
    }

    #[test]
    fn duplicate_path_is_rejected() {
        let report = parse("1 Intro\n1.1 Basics\n1.1 Basics again");
        let intro = &report.outline.children[0];
        assert_eq!(intro.children.len(), 1);
        assert_eq!(intro.children[0].title, "Basics");
        assert!(matches!(
            report.warnings[0],
            ParseWarning::DuplicatePath {
                line: 3,
                first_line: 2,
                ..
            }
        ));
    }

    #[test]
    fn zero_component_is_invalid() {
        let report = parse("0 Zero\n1 One\n1.0 Bad");
        assert_eq!(report.outline.node_count(), 1);
        assert_eq!(report.warnings.len(), 2);
        assert!(
            report
                .warnings
                .iter()
                .all(|w| matches!(w, ParseWarning::InvalidNumber { .. }))
        );
    }

    #[test]
    fn non_outline_lines_ignored() {
        let text = "# Course plan\n\nSome intro prose.\n---\n1 Intro\n\n  * * *\n1.1 Basics\n";
        let report = parse(text);
        assert!(report.warnings.is_empty());
        assert_eq!(report.outline.node_count(), 2);
        assert_eq!(find_node(&report.outline, "1.1").line, 8);
    }

    #[test]
    fn markdown_decoration_stripped() {
        let outline = parse_ok("## 1. **Вступ**\n- 1.1 `Cargo` і crates\n> **1.2** Основи\n");
        assert_eq!(find_node(&outline, "1").title, "Вступ");
        assert_eq!(find_node(&outline, "1.1").title, "Cargo і crates");
        assert_eq!(find_node(&outline, "1.2").title, "Основи");
    }

    #[test]
    fn keywords_and_repeated_number_stripped() {
        let outline = parse_ok(
            "1 Розділ 1. Основи\n1.1 Тема 1.1: Змінні\nTopic 1.2) Ownership\n1.3 Part: Traits 1.3",
        );
        assert_eq!(find_node(&outline, "1").title, "Основи");
        assert_eq!(find_node(&outline, "1.1").title, "Змінні");
        assert_eq!(find_node(&outline, "1.2").title, "Ownership");
        assert_eq!(find_node(&outline, "1.3").title, "Traits");
    }

    #[test]
    fn keyword_inside_word_is_kept() {
        let outline = parse_ok("1 Particles and Topics");
        assert_eq!(find_node(&outline, "1").title, "Particles and Topics");
    }

    #[test]
    fn hyphenated_keyword_word_is_kept() {
        let outline = parse_ok("1 A\n2 Part-time work\n3 Topic-based notes");
        assert_eq!(find_node(&outline, "2").title, "Part-time work");
        assert_eq!(find_node(&outline, "3").title, "Topic-based notes");
    }

    #[test]
    fn trailing_hash_is_kept() {
        let outline = parse_ok("1 C#\n2 F# and C#\n3 # Heading");
        assert_eq!(find_node(&outline, "1").title, "C#");
        assert_eq!(find_node(&outline, "2").title, "F# and C#");
        assert_eq!(find_node(&outline, "3").title, "Heading");
    }

    #[test]
    fn longer_numbers_containing_path_are_kept() {
        let outline = parse_ok("1 A\n1.2 HTTP 1.21 vs 11.2 and 1.2.5");
        assert_eq!(find_node(&outline, "1.2").title, "HTTP 1.21 vs 11.2 and 1.2.5");
    }

    #[test]
    fn internal_whitespace_collapsed() {
        let outline = parse_ok("1   Вступ    до\tRust  ");
        let intro = find_node(&outline, "1");
        assert_eq!(intro.title, "Вступ до Rust");
        assert_eq!(intro.slug, "1-vstup-do-rust");
        assert_eq!(intro.raw_title, "1   Вступ    до\tRust");
    }

    #[test]
    fn untransliterable_title_keeps_numeric_slug() {
        let outline = parse_ok("1 日本");
        assert_eq!(find_node(&outline, "1").slug, "1");
    }

    #[test]
    fn custom_keywords() {
        let parser = OutlineParser::new(&["Module".to_string()]).unwrap();
        let report = parser.parse("1 Module: Basics\n2 Тема: Kept");
        assert_eq!(report.outline.children[0].title, "Basics");
        assert_eq!(report.outline.children[1].title, "Тема: Kept");
    }

    #[test]
    fn no_keywords_configured() {
        let parser = OutlineParser::new(&[]).unwrap();
        let report = parser.parse("1 Topic: Basics");
        assert_eq!(report.outline.children[0].title, "Topic: Basics");
    }

    #[test]
    fn separate_documents_parse_independently() {
        let parser = OutlineParser::default();
        let first = parser.parse("1 One\n1.1 Child");
        let second = parser.parse("1.1 Child");
        assert_eq!(first.outline.node_count(), 2);
        assert_eq!(second.outline.node_count(), 0);
        assert_eq!(second.warnings.len(), 1);
    }

    #[test]
    fn display_title_numbering() {
        let outline = parse_ok(SCENARIO);
        let basics = find_node(&outline, "1.1");
        assert_eq!(basics.display_title(true), "1.1 Basics");
        assert_eq!(basics.display_title(false), "Basics");
    }

    #[test]
    fn node_path_helpers() {
        let path = NodePath::parse("2.10.3").unwrap();
        assert_eq!(path.level(), 3);
        assert_eq!(path.parent().dotted(), "2.10");
        assert_eq!(path.slug_prefix(), "2_10_3");
        assert!(NodePath::parse("1").unwrap().parent().is_root());
        assert_eq!(NodePath::parse("1..2"), None);
        assert_eq!(NodePath::parse("99999999999"), None);
    }
}
