//! Review CLI subcommands for inspecting and deciding on generated items.
//!
//! Provides commands to:
//! - `list`: Summarize items and their review state
//! - `show`: Display one item with its citation located in the document
//! - `patch`: Accept, reject, annotate, or re-cite an item

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use serde::Serialize;
use tracing::warn;

use crate::core::DocumentSource;
use crate::domain::{ItemPatch, ReviewItem};
use crate::library::ReviewStoreError;
use crate::matching::{offset_to_line_col, resolve, LineCol, SpanLookup};

use super::{kb_store, print_json, review_store};

/// Review-related subcommands
#[derive(Subcommand, Debug)]
pub enum ItemCommands {
    /// List review items
    List {
        /// Only show items in this state
        #[arg(long, value_enum)]
        status: Option<ReviewStatus>,
    },

    /// Show one review item
    Show {
        /// Item index (0-based, file order)
        index: usize,
    },

    /// Update one review item
    Patch {
        /// Item index (0-based, file order)
        index: usize,

        /// Mark the item accepted
        #[arg(long, conflicts_with = "reject")]
        accept: bool,

        /// Mark the item rejected
        #[arg(long)]
        reject: bool,

        /// Reviewer notes
        #[arg(long)]
        notes: Option<String>,

        /// Replacement citation
        #[arg(long)]
        citation: Option<String>,

        /// Start offset of the replacement citation
        #[arg(long, requires = "citation", requires = "end")]
        start: Option<i64>,

        /// End offset of the replacement citation
        #[arg(long, requires = "citation", requires = "start")]
        end: Option<i64>,
    },
}

/// Review state filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReviewStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ReviewStatus {
    fn of(item: &ReviewItem) -> Self {
        match item.accepted {
            None => ReviewStatus::Pending,
            Some(true) => ReviewStatus::Accepted,
            Some(false) => ReviewStatus::Rejected,
        }
    }
}

#[derive(Debug, Serialize)]
struct ItemSummary<'a> {
    index: usize,
    query: &'a str,
    doc_id: &'a str,
    accepted: Option<bool>,
}

#[derive(Debug, Serialize)]
struct ItemDetail<'a> {
    index: usize,
    #[serde(flatten)]
    item: &'a ReviewItem,
    /// Where the stored span starts, `None` if the document is unavailable
    location: Option<LineCol>,
    /// Whether the stored span still covers the citation text
    span_matches: Option<bool>,
}

/// Execute a review subcommand
pub fn execute(command: ItemCommands) -> Result<()> {
    match command {
        ItemCommands::List { status } => execute_list(status),
        ItemCommands::Show { index } => execute_show(index),
        ItemCommands::Patch {
            index,
            accept,
            reject,
            notes,
            citation,
            start,
            end,
        } => {
            let accepted = match (accept, reject) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let patch = ItemPatch {
                accepted,
                reviewer_notes: notes,
                citation,
                start_index: start,
                end_index: end,
                citation_overridden: None,
            };
            execute_patch(index, patch)
        }
    }
}

fn execute_list(status: Option<ReviewStatus>) -> Result<()> {
    let store = review_store()?;

    let summaries: Vec<ItemSummary> = store
        .all()
        .iter()
        .enumerate()
        .filter(|(_, item)| status.map_or(true, |s| ReviewStatus::of(item) == s))
        .map(|(index, item)| ItemSummary {
            index,
            query: &item.query,
            doc_id: &item.doc_id,
            accepted: item.accepted,
        })
        .collect();

    eprintln!(
        "[{} of {} items, {} accepted]",
        summaries.len(),
        store.len(),
        store.accepted_items().len()
    );

    print_json(&summaries)
}

fn execute_show(index: usize) -> Result<()> {
    let store = review_store()?;
    let item = store
        .get(index)
        .ok_or(ReviewStoreError::NotFound(index))?;

    let document = kb_store()?.get_document(&item.doc_id);
    let span = SpanLookup {
        found: item.start_index >= 0,
        start_index: item.start_index,
        end_index: item.end_index,
    }
    .span();

    let (location, span_matches) = match (&document, span) {
        (Some(document), Some(span)) => (
            Some(offset_to_line_col(document, span.start)),
            Some(span.slice(document) == item.citation),
        ),
        _ => (None, None),
    };

    print_json(&ItemDetail {
        index,
        item,
        location,
        span_matches,
    })
}

fn execute_patch(index: usize, mut patch: ItemPatch) -> Result<()> {
    let mut store = review_store()?;

    if let Some(citation) = &patch.citation {
        patch.citation_overridden = Some(true);

        if patch.start_index.is_none() {
            let item = store
                .get(index)
                .ok_or(ReviewStoreError::NotFound(index))?;
            let lookup = recompute_span(citation, &item.doc_id)?;
            if !lookup.found {
                warn!(index, doc_id = %item.doc_id, "Replacement citation not found in document");
            }
            patch.start_index = Some(lookup.start_index);
            patch.end_index = Some(lookup.end_index);
        }
    }

    let item = store.update(index, &patch)?;
    print_json(item)
}

/// Locate a replacement citation in the item's document
fn recompute_span(citation: &str, doc_id: &str) -> Result<SpanLookup> {
    let document = kb_store()?
        .get_document(doc_id)
        .with_context(|| format!("Document not found: {}", doc_id))?;
    Ok(SpanLookup::from(resolve(citation, &document)))
}
