//! Record of the last generation, stored next to the output.
//!
//! The cleaner needs to know which top-level directories the *previous*
//! build created: after a branch is deleted from the outline, the current
//! outline no longer mentions it, so only this record can tell the cleaner to
//! remove it.
//!
//! ## Storage
//!
//! A JSON file at `<output_dir>/.outline-site.json`:
//!
//! ```json
//! {
//!   "version": 1,
//!   "outline_hash": "3b1f…",
//!   "top_level": ["1-intro", "2-topics"],
//!   "pages": ["index.md", "1-intro/index.md", "1-intro/1_1-basics/index.md"]
//! }
//! ```
//!
//! The record holds no timestamps, so rebuilding unchanged input rewrites it
//! byte for byte. A missing, unreadable, or other-version record loads as
//! `None`; callers fall back to the current outline.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io;
use std::path::Path;

/// Name of the record file within the output directory.
pub const MANIFEST_FILENAME: &str = ".outline-site.json";

/// Bump when the record format changes; older records are then ignored.
const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationManifest {
    pub version: u32,
    /// SHA-256 of the outline text the output was generated from.
    pub outline_hash: String,
    /// Slugs of the depth-1 directories created under the output root.
    pub top_level: Vec<String>,
    /// Every written page, relative to the output root, `/`-separated.
    pub pages: Vec<String>,
}

impl GenerationManifest {
    pub fn new(outline_text: &str, top_level: Vec<String>, pages: Vec<String>) -> Self {
        Self {
            version: MANIFEST_VERSION,
            outline_hash: hash_text(outline_text),
            top_level,
            pages,
        }
    }

    /// Load from the output directory, or `None` if there is no usable record.
    pub fn load(output_dir: &Path) -> Option<Self> {
        let path = output_dir.join(MANIFEST_FILENAME);
        let content = std::fs::read_to_string(&path).ok()?;
        let manifest: Self = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable generation record");
                return None;
            }
        };
        if manifest.version != MANIFEST_VERSION {
            tracing::debug!(version = manifest.version, "ignoring generation record from another version");
            return None;
        }
        Some(manifest)
    }

    /// Save to the output directory.
    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        let path = output_dir.join(MANIFEST_FILENAME);
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        std::fs::write(path, json)
    }

    /// Whether this record was produced from exactly `outline_text`.
    pub fn matches(&self, outline_text: &str) -> bool {
        self.outline_hash == hash_text(outline_text)
    }
}

/// SHA-256 of text, returned as a hex string.
pub fn hash_text(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}
