//! # Outline Site
//!
//! Turns a plain-text course outline into a navigable documentation site.
//! Every numbered line (`1.2.3 Змінні`) becomes a directory holding a page
//! with navigation front matter; the directory tree mirrors the numbering.
//!
//! # Architecture: Build, Then Fill
//!
//! ```text
//! 1. Build   content.md  →  site/              (outline → page skeleton with placeholders)
//! 2. Fill    queue file  →  site/ (in place)   (placeholders → generated text)
//! ```
//!
//! The build is deterministic and fast: running it twice over the same
//! outline produces byte-identical output. Filling is slow and external
//! (one command run per page), so it is driven by a resumable queue file
//! and never runs as part of a build.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`outline`] | Parses outline text into a numbered tree, collecting warnings for skipped lines |
//! | [`slug`] | Directory-name slugs with Ukrainian transliteration |
//! | [`page`] | Page documents: YAML front matter plus markdown body |
//! | [`materialize`] | Writes the tree as nested directories of pages, plus the home page |
//! | [`clean`] | Removes the previous build's top-level sections before writing |
//! | [`manifest`] | Generation record: what the last build wrote, for cleaning and status |
//! | [`compile`] | Sequences read → parse → clean → write → record |
//! | [`fill`] | Content fillers: the trait, an external-command filler, a placeholder filler |
//! | [`queue`] | Resumable queue driver that fills pages in place |
//! | [`config`] | `outline-site.toml` loading, validation, and stock defaults |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Numbers Are Identity
//!
//! A section is identified by its dotted number, not its position in the
//! file. Parents are found by dropping the last number component, so lines
//! may appear in any order after their parent. The number is also the slug
//! prefix (`1_2_3-zminni`), which keeps directory names unique even when two
//! sections share a title.
//!
//! ## Clean Only What We Made
//!
//! The output directory usually doubles as a site repository with theme
//! files, assets, and configuration. The cleaner therefore deletes nothing
//! but the top-level section directories recorded by the previous build,
//! its home page, and its record. Everything else in the directory is left
//! alone.
//!
//! ## Filling Through Any Command
//!
//! Text generation is delegated to an external command reading a prompt on
//! stdin. The crate carries no HTTP client, API keys, or vendor SDK; any
//! model CLI, script, or `cat` for testing can stand in.

pub mod clean;
pub mod compile;
pub mod config;
pub mod fill;
pub mod manifest;
pub mod materialize;
pub mod outline;
pub mod output;
pub mod page;
pub mod queue;
pub mod slug;

#[cfg(test)]
pub(crate) mod test_helpers;
