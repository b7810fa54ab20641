//! Core validation logic.
//!
//! This module contains:
//! - Validator: sequential batch validation of candidate pairs
//! - Document: the document lookup seam and its cache

pub mod document;
pub mod validator;

// Re-export commonly used types
pub use document::{CachedSource, DocumentSource, DEFAULT_CACHE_CAPACITY};
pub use validator::{validate_answers, validate_batch, BatchValidator, ValidationError};
