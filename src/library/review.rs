//! Review store backed by review.jsonl.
//!
//! On first open the store is seeded from the generator's output.jsonl, with
//! review fields defaulted. Every update rewrites the whole file atomically
//! (temp file in the same directory, then rename) while holding an exclusive
//! lock on a sidecar `.lock` file, so concurrent reviewers never interleave
//! writes.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

use crate::domain::{ItemPatch, ReviewItem};

/// Errors that can occur with the review store
#[derive(Debug, Error)]
pub enum ReviewStoreError {
    #[error("Review item not found: {0}")]
    NotFound(usize),

    #[error("No fields to update")]
    EmptyPatch,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid JSON on line {line} of {path}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
}

/// Ordered list of review items persisted as JSONL
#[derive(Debug)]
pub struct ReviewStore {
    /// Path to review.jsonl
    review_path: PathBuf,

    /// Items in file order
    items: Vec<ReviewItem>,
}

impl ReviewStore {
    /// Open the store, seeding review.jsonl from `seed_path` if needed
    ///
    /// - review.jsonl exists: load it
    /// - otherwise the seed file exists: load it, default review fields, write review.jsonl
    /// - neither: empty store (nothing is written)
    pub fn open(
        review_path: impl Into<PathBuf>,
        seed_path: &Path,
    ) -> Result<Self, ReviewStoreError> {
        let review_path = review_path.into();

        let items = if review_path.exists() {
            load_jsonl(&review_path)?
        } else if seed_path.exists() {
            let items = load_jsonl(seed_path)?;
            save_jsonl(&review_path, &items)?;
            info!(
                count = items.len(),
                seed = %seed_path.display(),
                "Seeded review store"
            );
            items
        } else {
            Vec::new()
        };

        Ok(Self { review_path, items })
    }

    pub fn path(&self) -> &Path {
        &self.review_path
    }

    pub fn all(&self) -> &[ReviewItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&ReviewItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items a reviewer explicitly accepted, in file order
    pub fn accepted_items(&self) -> Vec<&ReviewItem> {
        self.items.iter().filter(|item| item.is_accepted()).collect()
    }

    /// Questions of accepted items, usable as duplicate-detection history
    pub fn accepted_questions(&self) -> Vec<String> {
        self.accepted_items()
            .into_iter()
            .map(|item| item.query.clone())
            .collect()
    }

    /// Apply a patch to one item and persist
    ///
    /// The file is re-read under the lock so updates made by another process
    /// since `open` are not lost.
    pub fn update(&mut self, index: usize, patch: &ItemPatch) -> Result<&ReviewItem, ReviewStoreError> {
        if patch.is_empty() {
            return Err(ReviewStoreError::EmptyPatch);
        }

        let lock = self.lock()?;

        if self.review_path.exists() {
            self.items = load_jsonl(&self.review_path)?;
        }

        let item = self
            .items
            .get_mut(index)
            .ok_or(ReviewStoreError::NotFound(index))?;
        patch.apply(item);

        save_jsonl(&self.review_path, &self.items)?;
        drop(lock);

        info!(index, "Review item updated");
        self.items.get(index).ok_or(ReviewStoreError::NotFound(index))
    }

    /// Acquire the exclusive sidecar lock; released when the file is dropped
    fn lock(&self) -> Result<File, ReviewStoreError> {
        let mut lock_path = self.review_path.clone().into_os_string();
        lock_path.push(".lock");

        if let Some(parent) = self.review_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(PathBuf::from(lock_path))?;
        file.lock_exclusive()?;
        Ok(file)
    }
}

/// Load review items from a JSONL file, skipping blank lines
fn load_jsonl(path: &Path) -> Result<Vec<ReviewItem>, ReviewStoreError> {
    let reader = BufReader::new(File::open(path)?);
    let mut items = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(&line).map_err(|source| ReviewStoreError::Parse {
            path: path.to_path_buf(),
            line: idx + 1,
            source,
        })?;
        items.push(item);
    }

    Ok(items)
}

/// Atomically replace `path` with one JSON line per item
fn save_jsonl(path: &Path, items: &[ReviewItem]) -> Result<(), ReviewStoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let tmp = NamedTempFile::new_in(&dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        for item in items {
            serde_json::to_writer(&mut writer, item)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;

    // an unpersisted temp file is removed on drop
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
