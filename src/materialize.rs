//! Writing the outline tree to disk.
//!
//! Stage 3 of the build (after parsing and cleaning). Every outline node
//! becomes a directory named by its slug, nested under its parent's
//! directory, holding a page with navigation front matter. Deep nodes get a
//! companion Q&A page in the same directory.
//!
//! ## Output Structure
//!
//! ```text
//! site/
//! ├── index.md                          # Home page listing top-level sections
//! ├── .outline-site.json                # Generation record (see manifest)
//! ├── 1-vstup/
//! │   ├── index.md
//! │   └── 1_1-osnovy/
//! │       ├── index.md
//! │       └── 1_1_1-zminni/
//! │           ├── index.md              # links to qa.md
//! │           └── qa.md                 # links back to index.md
//! └── 2-praktyka/
//!     └── index.md
//! ```
//!
//! ## Breadcrumbs
//!
//! Navigation themes resolve a page's position from `parent` and
//! `grand_parent` titles only, so the walk threads a two-title window down
//! the tree instead of the full ancestor chain.
//!
//! ## Failure
//!
//! Scaffolding is fail-fast: children need their parent's directory, so the
//! first failed node aborts the walk. A node whose Q&A page cannot be
//! written has its primary page removed again and is reported as failed.

use crate::config::PagesConfig;
use crate::outline::{NodePath, Outline, OutlineNode};
use crate::page::{FrontMatter, PageDocument, PageError, placeholder_body, with_link};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const HOME_INTRO: &str = "Select a topic from the navigation to get started.";

#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error("cannot write {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("section {node} (line {line}): cannot write {}: {source}", .path.display())]
    Section {
        node: NodePath,
        line: usize,
        path: PathBuf,
        source: io::Error,
    },
    #[error("page error: {0}")]
    Page(#[from] PageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Home,
    Primary,
    Qa,
}

/// One file written by the materializer.
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenPage {
    /// Path relative to the output root, `/`-separated.
    pub path: String,
    pub kind: PageKind,
    /// Outline node the page belongs to; `None` for the home page.
    pub node: Option<NodePath>,
    pub title: String,
    pub nav_order: u32,
}

/// Everything a build wrote, in write order (parents before children).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterializeReport {
    pub pages: Vec<WrittenPage>,
    /// Slugs of the depth-1 directories.
    pub top_level: Vec<String>,
}

impl MaterializeReport {
    pub fn page_paths(&self) -> Vec<String> {
        self.pages.iter().map(|p| p.path.clone()).collect()
    }

    /// Pages the content filler should visit: all section and Q&A pages.
    ///
    /// Q&A pages come after their primary page, whose text they summarize.
    pub fn fill_queue(&self) -> Vec<String> {
        self.pages
            .iter()
            .filter(|p| p.kind != PageKind::Home)
            .map(|p| p.path.clone())
            .collect()
    }

    pub fn count(&self, kind: PageKind) -> usize {
        self.pages.iter().filter(|p| p.kind == kind).count()
    }
}

/// Parent and grandparent titles handed from a node to its children.
#[derive(Debug, Clone, Copy, Default)]
struct Breadcrumb<'a> {
    parent: Option<&'a str>,
    grand_parent: Option<&'a str>,
}

/// Write `outline` under `output_root`, then the root index page.
pub fn materialize(
    outline: &Outline,
    output_root: &Path,
    pages: &PagesConfig,
) -> Result<MaterializeReport, MaterializeError> {
    fs::create_dir_all(output_root).map_err(|source| MaterializeError::Io {
        path: output_root.to_path_buf(),
        source,
    })?;

    let mut report = MaterializeReport::default();
    for node in &outline.children {
        write_node(node, output_root, "", Breadcrumb::default(), pages, &mut report)?;
        report.top_level.push(node.slug.clone());
    }

    let home = render_home(outline, pages)?;
    let home_path = output_root.join(&pages.index_file);
    write_atomic(&home_path, &home).map_err(|source| MaterializeError::Io {
        path: home_path.clone(),
        source,
    })?;
    report.pages.push(WrittenPage {
        path: pages.index_file.clone(),
        kind: PageKind::Home,
        node: None,
        title: pages.home_title.clone(),
        nav_order: 1,
    });

    info!(
        sections = report.count(PageKind::Primary),
        qa_pages = report.count(PageKind::Qa),
        root = %output_root.display(),
        "materialized outline"
    );
    Ok(report)
}

fn write_node(
    node: &OutlineNode,
    parent_dir: &Path,
    parent_rel: &str,
    crumbs: Breadcrumb<'_>,
    pages: &PagesConfig,
    report: &mut MaterializeReport,
) -> Result<(), MaterializeError> {
    let dir = parent_dir.join(&node.slug);
    let rel = if parent_rel.is_empty() {
        node.slug.clone()
    } else {
        format!("{parent_rel}/{}", node.slug)
    };
    let section_err = |path: &Path, source: io::Error| MaterializeError::Section {
        node: node.path.clone(),
        line: node.line,
        path: path.to_path_buf(),
        source,
    };

    fs::create_dir_all(&dir).map_err(|e| section_err(&dir, e))?;

    let title = node.display_title(pages.numbered_titles);
    let with_qa = node.level() >= pages.qa_min_level;

    let mut body = placeholder_body(&title, &pages.placeholder);
    if with_qa {
        body = with_link(&body, &pages.qa_link_label, &pages.qa_file);
    }
    let primary = PageDocument::new(
        FrontMatter {
            layout: pages.layout.clone(),
            title: title.clone(),
            parent: crumbs.parent.map(str::to_string),
            grand_parent: crumbs.grand_parent.map(str::to_string),
            nav_order: node.nav_order,
            has_children: node.has_children(),
            nav_exclude: None,
        },
        body,
    )
    .render()?;

    let qa = if with_qa {
        let qa_title = qa_title(node, pages.numbered_titles);
        let body = with_link(
            &placeholder_body(&qa_title, &pages.placeholder),
            &pages.back_link_label,
            &pages.index_file,
        );
        let doc = PageDocument::new(
            FrontMatter {
                layout: pages.layout.clone(),
                title: qa_title.clone(),
                parent: crumbs.parent.map(str::to_string),
                grand_parent: crumbs.grand_parent.map(str::to_string),
                nav_order: node.nav_order,
                has_children: false,
                nav_exclude: Some(true),
            },
            body,
        );
        Some((qa_title, doc.render()?))
    } else {
        None
    };

    let primary_path = dir.join(&pages.index_file);
    write_atomic(&primary_path, &primary).map_err(|e| section_err(&primary_path, e))?;

    if let Some((_, content)) = &qa {
        let qa_path = dir.join(&pages.qa_file);
        if let Err(e) = write_atomic(&qa_path, content) {
            // Don't leave a primary page that links to a missing Q&A page.
            let _ = fs::remove_file(&primary_path);
            return Err(section_err(&qa_path, e));
        }
    }

    debug!(node = %node.path, dir = %rel, qa = with_qa, "wrote section");
    report.pages.push(WrittenPage {
        path: format!("{rel}/{}", pages.index_file),
        kind: PageKind::Primary,
        node: Some(node.path.clone()),
        title: title.clone(),
        nav_order: node.nav_order,
    });
    if let Some((qa_title, _)) = qa {
        report.pages.push(WrittenPage {
            path: format!("{rel}/{}", pages.qa_file),
            kind: PageKind::Qa,
            node: Some(node.path.clone()),
            title: qa_title,
            nav_order: node.nav_order,
        });
    }

    let child_crumbs = Breadcrumb {
        parent: Some(title.as_str()),
        grand_parent: crumbs.parent,
    };
    for child in &node.children {
        write_node(child, &dir, &rel, child_crumbs, pages, report)?;
    }
    Ok(())
}

fn qa_title(node: &OutlineNode, numbered: bool) -> String {
    if numbered {
        format!("{} Q&A: {}", node.path, node.title)
    } else {
        format!("Q&A: {}", node.title)
    }
}

/// Root index page: home layout plus links to every top-level section.
fn render_home(outline: &Outline, pages: &PagesConfig) -> Result<String, PageError> {
    let mut body = format!("# {}\n\n{HOME_INTRO}\n", pages.home_heading);
    if !outline.children.is_empty() {
        body.push('\n');
        for node in &outline.children {
            body.push_str(&format!(
                "- [{}](./{}/)\n",
                node.display_title(pages.numbered_titles),
                node.slug
            ));
        }
    }
    PageDocument::new(
        FrontMatter {
            layout: pages.home_layout.clone(),
            title: pages.home_title.clone(),
            parent: None,
            grand_parent: None,
            nav_order: 1,
            has_children: false,
            nav_exclude: None,
        },
        body,
    )
    .render()
}

/// Write through a temporary sibling file so a failed write never leaves a
/// truncated page behind.
pub(crate) fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}
