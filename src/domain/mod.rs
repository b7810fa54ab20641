//! Domain types for citeguard.
//!
//! This module contains the core data structures:
//! - Pairs: candidate question/evidence pairs and validation outcomes
//! - Review: persisted review items and reviewer patches

pub mod pair;
pub mod review;

// Re-export commonly used types
pub use pair::{
    CandidatePair, RejectedPair, Rejection, RejectionReason, ValidPair, ValidationOutcome,
    Vocabulary,
};
pub use review::{ItemPatch, QueryMetadata, ReviewItem};
