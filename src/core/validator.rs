//! Batch validation of generated question/evidence pairs.
//!
//! For each pair, in input order:
//! 1. the evidence (citation or answer) must be present
//! 2. the evidence must be located in the source document
//! 3. the question must not duplicate the history or any question accepted
//!    earlier in the same batch
//!
//! Order matters: duplicate detection is first-match against a set that grows
//! as pairs are accepted, so a batch is always processed sequentially.

use thiserror::Error;
use tracing::{debug, info};

use crate::core::document::DocumentSource;
use crate::domain::{
    CandidatePair, RejectedPair, Rejection, ValidPair, ValidationOutcome, Vocabulary,
};
use crate::matching::{
    check_answer, find_duplicate, resolve, DuplicateCheck, Span, DEFAULT_ANSWER_THRESHOLD,
    DEFAULT_QUESTION_THRESHOLD,
};

/// Failures that stop a whole batch
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Document unavailable: {doc_id}")]
    DocumentUnavailable { doc_id: String },
}

/// Where the evidence was found
#[derive(Debug, Clone, Copy, PartialEq)]
struct Located {
    span: Option<Span>,
    match_score: Option<f64>,
}

/// Validator settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchValidator {
    /// Field naming and evidence check to use
    pub vocabulary: Vocabulary,

    /// Similarity at which a question counts as a duplicate (default: 0.95)
    pub question_threshold: f64,

    /// Fuzzy score an answer must reach, answer vocabulary only (default: 0.95)
    pub answer_threshold: f64,
}

impl Default for BatchValidator {
    fn default() -> Self {
        Self {
            vocabulary: Vocabulary::Citation,
            question_threshold: DEFAULT_QUESTION_THRESHOLD,
            answer_threshold: DEFAULT_ANSWER_THRESHOLD,
        }
    }
}

impl BatchValidator {
    /// Validator for `query`/`citation` pairs with exact span resolution
    pub fn citations() -> Self {
        Self::default()
    }

    /// Validator for `question`/`answer` pairs with fuzzy matching
    pub fn answers() -> Self {
        Self {
            vocabulary: Vocabulary::Answer,
            ..Self::default()
        }
    }

    pub fn with_question_threshold(mut self, threshold: f64) -> Self {
        self.question_threshold = threshold;
        self
    }

    pub fn with_answer_threshold(mut self, threshold: f64) -> Self {
        self.answer_threshold = threshold;
        self
    }

    /// Validate a batch against one document
    ///
    /// `history` is never modified; questions accepted in this batch are
    /// tracked locally and checked after it.
    pub fn validate(
        &self,
        pairs: &[CandidatePair],
        document: &str,
        history: &[String],
    ) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();
        let mut accepted: Vec<String> = Vec::new();

        for (position, pair) in pairs.iter().enumerate() {
            let located = match self.locate_evidence(pair, document) {
                Ok(located) => located,
                Err(rejection) => {
                    debug!(position, reason = %rejection.reason(), "Pair rejected");
                    outcome.rejected.push(RejectedPair::new(pair, rejection));
                    continue;
                }
            };

            let question = self.vocabulary.question(pair).to_string();
            let seen = history
                .iter()
                .chain(accepted.iter())
                .map(String::as_str);

            if let DuplicateCheck {
                is_duplicate: true,
                matched: Some(duplicate_of),
                score,
            } = find_duplicate(&question, seen, self.question_threshold)
            {
                debug!(position, score, "Pair rejected as duplicate question");
                outcome.rejected.push(RejectedPair::new(
                    pair,
                    Rejection::DuplicateQuestion {
                        similarity_score: score,
                        duplicate_of,
                    },
                ));
                continue;
            }

            accepted.push(question);
            outcome
                .valid
                .push(ValidPair::new(pair, located.span, located.match_score));
        }

        info!(
            vocabulary = ?self.vocabulary,
            total = outcome.len(),
            valid = outcome.valid.len(),
            rejected = outcome.rejected.len(),
            "Batch validated"
        );

        outcome
    }

    /// Fetch the document from `source` and validate against it
    ///
    /// A missing document fails the whole batch rather than rejecting each pair.
    pub fn validate_document<S: DocumentSource + ?Sized>(
        &self,
        source: &S,
        doc_id: &str,
        pairs: &[CandidatePair],
        history: &[String],
    ) -> Result<ValidationOutcome, ValidationError> {
        let document =
            source
                .get_document(doc_id)
                .ok_or_else(|| ValidationError::DocumentUnavailable {
                    doc_id: doc_id.to_string(),
                })?;

        Ok(self.validate(pairs, &document, history))
    }

    fn locate_evidence(&self, pair: &CandidatePair, document: &str) -> Result<Located, Rejection> {
        let evidence = self.vocabulary.evidence(pair);

        match self.vocabulary {
            Vocabulary::Citation => {
                let citation = evidence.ok_or(Rejection::CitationNull)?;
                let span = resolve(citation, document).ok_or(Rejection::CitationNotFound)?;
                Ok(Located {
                    span: Some(span),
                    match_score: None,
                })
            }
            Vocabulary::Answer => {
                let answer = evidence
                    .filter(|a| !a.is_empty())
                    .ok_or(Rejection::AnswerMissing)?;

                let matched = check_answer(answer, document, self.answer_threshold);
                if !matched.valid {
                    return Err(Rejection::AnswerMismatch {
                        match_score: matched.score,
                    });
                }

                Ok(Located {
                    span: resolve(answer, document),
                    match_score: Some(matched.score),
                })
            }
        }
    }
}

/// Validate `query`/`citation` pairs against a document
pub fn validate_batch(
    pairs: &[CandidatePair],
    document: &str,
    history: &[String],
    question_threshold: f64,
) -> ValidationOutcome {
    BatchValidator::citations()
        .with_question_threshold(question_threshold)
        .validate(pairs, document, history)
}

/// Validate `question`/`answer` pairs against a document with fuzzy matching
pub fn validate_answers(
    pairs: &[CandidatePair],
    document: &str,
    history: &[String],
    question_threshold: f64,
    answer_threshold: f64,
) -> ValidationOutcome {
    BatchValidator::answers()
        .with_question_threshold(question_threshold)
        .with_answer_threshold(answer_threshold)
        .validate(pairs, document, history)
}
