//! File-backed collaborators of the validator.
//!
//! # Storage Layout
//!
//! ```text
//! <project root>/
//! ├── kb/                # Source documents, addressed by relative path
//! │   └── policies/returns.md
//! ├── output.jsonl       # Generated pairs (seed for review.jsonl)
//! └── review.jsonl       # Pairs with reviewer decisions
//! ```

pub mod kb;
pub mod review;

pub use kb::{strip_front_matter, KbStore};
pub use review::{ReviewStore, ReviewStoreError};
