//! citeguard - Citation span resolver and batch validator
//!
//! Validates LLM-generated question/citation pairs against the documents
//! they were generated from, before they enter an evaluation dataset.
//!
//! # Pipeline
//!
//! For each pair in a batch generated from one document:
//! - the citation must be located in the document (exact, then whitespace-tolerant)
//! - the question must not be a near-duplicate of an accepted question
//! - survivors are annotated with the citation's character span
//!
//! # Modules
//!
//! - `matching`: Pure text matching (span resolution, similarity, fuzzy answers)
//! - `domain`: Data structures (CandidatePair, ValidationOutcome, ReviewItem)
//! - `core`: Batch validation and the document lookup seam
//! - `library`: File-backed knowledge base and review store
//! - `adapters`: Dataset upload targets (LangSmith)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Locate a citation
//! citeguard span --citation "The sky is blue." --doc-id colors.md
//!
//! # Validate a generated batch against its document
//! citeguard validate --pairs batch.json --doc-id colors.md --from-review
//!
//! # Accept a reviewed item
//! citeguard items patch 3 --accept
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod library;
pub mod matching;

// Re-export main types at crate root for convenience
pub use crate::core::{
    validate_answers, validate_batch, BatchValidator, DocumentSource, ValidationError,
};
pub use domain::{
    CandidatePair, RejectedPair, RejectionReason, ReviewItem, ValidPair, ValidationOutcome,
};
pub use library::{KbStore, ReviewStore};
pub use matching::{check_answer, is_duplicate, resolve, similarity, Span, SpanLookup};
