//! Text matching primitives for review validation
//!
//! Everything here is pure: no I/O, no shared state.
//!
//! - `spans`: map a citation onto its character range in a source document,
//!   tolerating whitespace-only differences
//! - `similarity`: normalized similarity ratio and first-match duplicate detection
//! - `fuzzy`: sliding-window answer matching for paraphrased answers
//!
//! # Example
//!
//! ```ignore
//! use citeguard::matching::{resolve, is_duplicate, SpanLookup};
//!
//! let lookup = SpanLookup::from(resolve(&citation, &document));
//! let check = is_duplicate(&question, &history, DEFAULT_QUESTION_THRESHOLD);
//! ```

pub mod fuzzy;
pub mod similarity;
pub mod spans;

pub use fuzzy::{check_answer, FuzzyMatch, DEFAULT_ANSWER_THRESHOLD};
pub use similarity::{
    find_duplicate, is_duplicate, normalize, similarity, DuplicateCheck,
    DEFAULT_QUESTION_THRESHOLD,
};
pub use spans::{
    collapse_whitespace, offset_to_line_col, resolve, resolve_detailed, LineCol, MatchMethod,
    Resolution, Span, SpanLookup,
};
