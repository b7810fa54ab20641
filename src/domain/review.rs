//! Review items as persisted in review.jsonl.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::pair::CandidatePair;

/// Generation metadata attached to a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMetadata {
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default)]
    pub has_typos: bool,

    #[serde(default = "default_tone")]
    pub tone: String,

    #[serde(default = "default_style")]
    pub style: String,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_tone() -> String {
    "neutral".to_string()
}

fn default_style() -> String {
    "question".to_string()
}

impl Default for QueryMetadata {
    fn default() -> Self {
        Self {
            language: default_language(),
            has_typos: false,
            tone: default_tone(),
            style: default_style(),
        }
    }
}

/// A generated query/citation pair under human review
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    #[serde(default)]
    pub query: String,

    /// Document identifier, relative to the knowledge-base root
    #[serde(default)]
    pub doc_id: String,

    #[serde(default)]
    pub citation: String,

    /// Char offset of the citation in the document
    #[serde(default)]
    pub start_index: i64,

    #[serde(default)]
    pub end_index: i64,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub subcategory: String,

    #[serde(default)]
    pub chunks: Vec<String>,

    #[serde(default)]
    pub source: Vec<String>,

    #[serde(default)]
    pub query_metadata: Option<QueryMetadata>,

    /// `None` until a reviewer decides
    #[serde(default)]
    pub accepted: Option<bool>,

    #[serde(default)]
    pub reviewer_notes: String,

    /// Set when a reviewer replaced the generated citation
    #[serde(default)]
    pub citation_overridden: bool,

    /// Fields this schema does not know about, kept across rewrites
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ReviewItem {
    pub fn is_accepted(&self) -> bool {
        self.accepted == Some(true)
    }

    /// Citation-vocabulary view of this item, for re-validation
    pub fn to_candidate_pair(&self) -> CandidatePair {
        CandidatePair::new(&self.query, Some(&self.citation))
            .with_field("doc_id", self.doc_id.as_str())
            .with_field("category", self.category.as_str())
            .with_field("subcategory", self.subcategory.as_str())
    }
}

/// Partial update to a review item; only present fields are applied
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer_notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_index: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_overridden: Option<bool>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.accepted.is_none()
            && self.reviewer_notes.is_none()
            && self.citation.is_none()
            && self.start_index.is_none()
            && self.end_index.is_none()
            && self.citation_overridden.is_none()
    }

    /// Apply present fields to `item`
    pub fn apply(&self, item: &mut ReviewItem) {
        if let Some(accepted) = self.accepted {
            item.accepted = Some(accepted);
        }
        if let Some(notes) = &self.reviewer_notes {
            item.reviewer_notes = notes.clone();
        }
        if let Some(citation) = &self.citation {
            item.citation = citation.clone();
        }
        if let Some(start) = self.start_index {
            item.start_index = start;
        }
        if let Some(end) = self.end_index {
            item.end_index = end;
        }
        if let Some(overridden) = self.citation_overridden {
            item.citation_overridden = overridden;
        }
    }
}
