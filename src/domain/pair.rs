//! Candidate pairs and the outcome of validating them.
//!
//! A candidate pair is an open JSON object produced upstream. The validator
//! only reads the question and evidence fields named by a [`Vocabulary`] and
//! returns annotated copies; every other field passes through untouched.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::matching::Span;

/// A generated question/evidence pair awaiting validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidatePair {
    fields: Map<String, Value>,
}

impl CandidatePair {
    /// Create a pair in the citation vocabulary
    ///
    /// A `None` citation is stored as an explicit JSON null.
    pub fn new(query: &str, citation: Option<&str>) -> Self {
        Self::default()
            .with_field("query", query)
            .with_field("citation", citation.map_or(Value::Null, Value::from))
    }

    /// Wrap an arbitrary JSON object
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Set a field, replacing any previous value
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String value of a field, `None` if absent, null, or not a string
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Copy of this pair without `keys`
    pub fn without(&self, keys: &[&str]) -> Self {
        let mut fields = self.fields.clone();
        for key in keys {
            fields.remove(*key);
        }
        Self { fields }
    }
}

/// Field naming used by a batch of pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vocabulary {
    /// `query` / `citation`, resolved to an exact span
    Citation,
    /// `question` / `answer` (falling back to `query` / `citation`), matched fuzzily
    Answer,
}

impl Vocabulary {
    fn question_keys(self) -> &'static [&'static str] {
        match self {
            Vocabulary::Citation => &["query"],
            Vocabulary::Answer => &["question", "query"],
        }
    }

    fn evidence_keys(self) -> &'static [&'static str] {
        match self {
            Vocabulary::Citation => &["citation"],
            Vocabulary::Answer => &["answer", "citation"],
        }
    }

    /// The pair's question, or `""` when it has none
    pub fn question<'p>(self, pair: &'p CandidatePair) -> &'p str {
        first_present(pair, self.question_keys())
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// The pair's citation or answer text
    ///
    /// Later keys are only consulted when earlier ones are absent; a present
    /// null or non-string value is not replaced by a fallback.
    pub fn evidence<'p>(self, pair: &'p CandidatePair) -> Option<&'p str> {
        first_present(pair, self.evidence_keys()).and_then(Value::as_str)
    }
}

fn first_present<'p>(pair: &'p CandidatePair, keys: &[&str]) -> Option<&'p Value> {
    keys.iter().find_map(|key| pair.get(key))
}

/// Closed set of reasons a pair can be rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    CitationNull,
    CitationNotFound,
    DuplicateQuestion,
    AnswerMissing,
    AnswerMismatch,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::CitationNull => "citation_null",
            RejectionReason::CitationNotFound => "citation_not_found",
            RejectionReason::DuplicateQuestion => "duplicate_question",
            RejectionReason::AnswerMissing => "answer_missing",
            RejectionReason::AnswerMismatch => "answer_mismatch",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejection reason together with its supporting detail
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rejection_reason", rename_all = "snake_case")]
pub enum Rejection {
    CitationNull,
    CitationNotFound,
    DuplicateQuestion {
        similarity_score: f64,
        duplicate_of: String,
    },
    AnswerMissing,
    AnswerMismatch {
        /// Best window score the fuzzy scan reached
        match_score: f64,
    },
}

impl Rejection {
    /// Keys this rejection writes onto the pair
    pub fn annotation_keys(&self) -> &'static [&'static str] {
        match self {
            Rejection::DuplicateQuestion { .. } => {
                &["rejection_reason", "similarity_score", "duplicate_of"]
            }
            Rejection::AnswerMismatch { .. } => &["rejection_reason", "match_score"],
            _ => &["rejection_reason"],
        }
    }

    pub fn reason(&self) -> RejectionReason {
        match self {
            Rejection::CitationNull => RejectionReason::CitationNull,
            Rejection::CitationNotFound => RejectionReason::CitationNotFound,
            Rejection::DuplicateQuestion { .. } => RejectionReason::DuplicateQuestion,
            Rejection::AnswerMissing => RejectionReason::AnswerMissing,
            Rejection::AnswerMismatch { .. } => RejectionReason::AnswerMismatch,
        }
    }
}

/// An accepted pair with its location in the source document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidPair {
    #[serde(flatten)]
    pub pair: CandidatePair,

    /// Char offset where the evidence starts (absent if it could not be pinned down)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_index: Option<usize>,

    /// Char offset one past the end of the evidence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_index: Option<usize>,

    /// Fuzzy match score, answer vocabulary only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<f64>,
}

impl ValidPair {
    /// Accept `pair`, replacing only the annotation keys that are emitted
    pub fn new(
        pair: &CandidatePair,
        span: Option<Span>,
        match_score: Option<f64>,
    ) -> Self {
        let mut written: Vec<&str> = Vec::with_capacity(3);
        if span.is_some() {
            written.extend(["start_index", "end_index"]);
        }
        if match_score.is_some() {
            written.push("match_score");
        }

        Self {
            pair: pair.without(&written),
            start_index: span.map(|s| s.start),
            end_index: span.map(|s| s.end),
            match_score,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match (self.start_index, self.end_index) {
            (Some(start), Some(end)) => Some(Span { start, end }),
            _ => None,
        }
    }
}

/// A rejected pair, original fields intact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedPair {
    #[serde(flatten)]
    pub pair: CandidatePair,

    #[serde(flatten)]
    pub rejection: Rejection,
}

impl RejectedPair {
    /// Reject `pair`, replacing only the keys `rejection` writes
    pub fn new(pair: &CandidatePair, rejection: Rejection) -> Self {
        Self {
            pair: pair.without(rejection.annotation_keys()),
            rejection,
        }
    }

    pub fn reason(&self) -> RejectionReason {
        self.rejection.reason()
    }
}

/// Partition of a batch into accepted and rejected pairs, both in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationOutcome {
    pub valid: Vec<ValidPair>,
    pub rejected: Vec<RejectedPair>,
}

impl ValidationOutcome {
    pub fn len(&self) -> usize {
        self.valid.len() + self.rejected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rejection counts keyed by reason
    pub fn rejection_counts(&self) -> BTreeMap<RejectionReason, usize> {
        let mut counts = BTreeMap::new();
        for rejected in &self.rejected {
            *counts.entry(rejected.reason()).or_insert(0) += 1;
        }
        counts
    }
}
