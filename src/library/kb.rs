//! Knowledge-base document store.
//!
//! Documents are plain files under a root directory, addressed by their path
//! relative to that root. YAML front-matter is stripped before the text is
//! handed to the validator.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::core::DocumentSource;

/// Leading `---` block, closed by the first `---` line after it
static FRONT_MATTER: OnceLock<Regex> = OnceLock::new();

fn front_matter() -> &'static Regex {
    FRONT_MATTER.get_or_init(|| {
        Regex::new(r"(?s)\A---\s*\n.*?\n---\s*\n?").expect("front-matter pattern is valid")
    })
}

/// Remove YAML front-matter if present
pub fn strip_front_matter(content: &str) -> &str {
    if !content.starts_with("---") {
        return content;
    }
    match front_matter().find(content) {
        Some(m) => &content[m.end()..],
        None => content,
    }
}

/// File-backed document store rooted at a knowledge-base directory
#[derive(Debug, Clone)]
pub struct KbStore {
    root: PathBuf,
}

impl KbStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a document id to a file inside the root
    ///
    /// Returns `None` for missing files and for ids that escape the root
    /// (`..` segments, absolute paths, symlinks pointing outside).
    pub fn resolve_path(&self, doc_id: &str) -> Option<PathBuf> {
        let root = self.root.canonicalize().ok()?;
        let resolved = root.join(doc_id).canonicalize().ok()?;

        if !resolved.starts_with(&root) {
            warn!(doc_id, "Document id escapes knowledge-base root");
            return None;
        }
        if !resolved.is_file() {
            return None;
        }

        Some(resolved)
    }

    /// Full file content including front-matter
    pub fn get_raw(&self, doc_id: &str) -> Option<String> {
        let path = self.resolve_path(doc_id)?;

        match std::fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) => {
                warn!(doc_id, path = %path.display(), error = %e, "Failed to read document");
                None
            }
        }
    }
}

impl DocumentSource for KbStore {
    fn get_document(&self, doc_id: &str) -> Option<String> {
        self.get_raw(doc_id)
            .map(|content| strip_front_matter(&content).to_string())
    }
}
