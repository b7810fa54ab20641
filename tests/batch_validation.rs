//! Batch Validation Integration Tests
//!
//! Tests for validating generated batches end to end: citation lookup,
//! duplicate questions against history and within the batch, and the
//! document-source seam.

use std::collections::HashMap;

use citeguard::core::{BatchValidator, CachedSource, ValidationError};
use citeguard::domain::{CandidatePair, Rejection, RejectionReason};
use citeguard::library::KbStore;
use citeguard::{validate_answers, validate_batch};
use serde_json::json;
use tempfile::TempDir;

const DOCUMENT: &str = "The sky is blue. Grass is green.";

fn pairs(value: serde_json::Value) -> Vec<CandidatePair> {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_mixed_batch() {
    let batch = pairs(json!([
        {"query": "What color is the sky?", "citation": "The sky is blue.", "category": "nature"},
        {"query": "What color is the grass?", "citation": "Grass is green."},
        {"query": "What colour is the sky?", "citation": "The sky is blue."},
        {"query": "Where is the ocean?", "citation": "The ocean is vast."},
        {"query": "Anything?", "citation": null},
    ]));

    let outcome = validate_batch(&batch, DOCUMENT, &[], 0.95);

    assert_eq!(outcome.valid.len(), 2);
    assert_eq!(outcome.rejected.len(), 3);

    let sky = &outcome.valid[0];
    assert_eq!((sky.start_index, sky.end_index), (Some(0), Some(16)));
    assert_eq!(sky.pair.text("category"), Some("nature"));

    let grass = &outcome.valid[1];
    assert_eq!((grass.start_index, grass.end_index), (Some(17), Some(32)));

    let reasons: Vec<_> = outcome.rejected.iter().map(|r| r.reason()).collect();
    assert_eq!(
        reasons,
        vec![
            RejectionReason::DuplicateQuestion,
            RejectionReason::CitationNotFound,
            RejectionReason::CitationNull,
        ]
    );

    match &outcome.rejected[0].rejection {
        Rejection::DuplicateQuestion {
            similarity_score,
            duplicate_of,
        } => {
            assert_eq!(duplicate_of, "What color is the sky?");
            assert!(*similarity_score >= 0.95 && *similarity_score < 1.0);
        }
        other => panic!("Expected duplicate rejection, got {:?}", other),
    }

    let counts = outcome.rejection_counts();
    assert_eq!(counts[&RejectionReason::CitationNull], 1);
    assert_eq!(counts.len(), 3);
}

#[test]
fn test_serialized_outcome_shape() {
    let batch = pairs(json!([
        {"query": "What color is the sky?", "citation": "The sky is blue.", "start_index": 99},
        {"query": "Where is the ocean?", "citation": "The ocean is vast."},
    ]));

    let outcome = validate_batch(&batch, DOCUMENT, &[], 0.95);
    let value = serde_json::to_value(&outcome).unwrap();

    assert_eq!(
        value["valid"][0],
        json!({
            "query": "What color is the sky?",
            "citation": "The sky is blue.",
            "start_index": 0,
            "end_index": 16,
        })
    );
    assert_eq!(value["rejected"][0]["rejection_reason"], "citation_not_found");
    assert_eq!(value["rejected"][0]["query"], "Where is the ocean?");
}

#[test]
fn test_history_duplicates_rejected() {
    let batch = pairs(json!([
        {"query": "What color is the sky?", "citation": "The sky is blue."},
    ]));
    let history = vec!["what color is the SKY?".to_string()];

    let outcome = validate_batch(&batch, DOCUMENT, &history, 0.95);

    assert!(outcome.valid.is_empty());
    match &outcome.rejected[0].rejection {
        Rejection::DuplicateQuestion {
            similarity_score,
            duplicate_of,
        } => {
            assert_eq!(*similarity_score, 1.0);
            assert_eq!(duplicate_of, "what color is the SKY?");
        }
        other => panic!("Expected duplicate rejection, got {:?}", other),
    }
}

#[test]
fn test_first_matching_history_entry_wins() {
    let batch = pairs(json!([
        {"query": "What is the capital of France?", "citation": "The sky is blue."},
    ]));
    let history = vec![
        "What is the capital of France".to_string(),
        "What is the capital of France?".to_string(),
    ];

    let outcome = validate_batch(&batch, DOCUMENT, &history, 0.95);

    match &outcome.rejected[0].rejection {
        Rejection::DuplicateQuestion {
            similarity_score,
            duplicate_of,
        } => {
            assert_eq!(duplicate_of, "What is the capital of France");
            assert!(*similarity_score < 1.0);
        }
        other => panic!("Expected duplicate rejection, got {:?}", other),
    }
}

#[test]
fn test_lower_threshold_catches_more() {
    let batch = pairs(json!([
        {"query": "What color is the sky?", "citation": "The sky is blue."},
        {"query": "What color is the grass?", "citation": "Grass is green."},
    ]));

    assert_eq!(validate_batch(&batch, DOCUMENT, &[], 0.95).valid.len(), 2);
    assert_eq!(validate_batch(&batch, DOCUMENT, &[], 0.5).valid.len(), 1);
}

#[test]
fn test_answer_batch_tolerates_paraphrase() {
    let document = "Refunds are issued to the original payment method within 14 days of receipt.";
    let batch = pairs(json!([
        {"question": "How are refunds paid?", "answer": "Refunds are issued to the original payment method within 14 days of receipt."},
        {"question": "How long do refunds take?", "answer": "refunds are issued to the original payment method within 14 day of receipt"},
        {"question": "Do you ship abroad?", "answer": "We ship to every country in the world."},
        {"question": "Is there a fee?", "answer": ""},
    ]));

    let outcome = validate_answers(&batch, document, &[], 0.95, 0.9);

    assert_eq!(outcome.valid.len(), 2);
    assert_eq!(outcome.valid[0].match_score, Some(1.0));
    assert_eq!(outcome.valid[0].start_index, Some(0));
    let paraphrased = outcome.valid[1].match_score.unwrap();
    assert!(paraphrased >= 0.9 && paraphrased < 1.0);
    assert!(outcome.valid[1].start_index.is_none());

    let reasons: Vec<_> = outcome.rejected.iter().map(|r| r.reason()).collect();
    assert_eq!(
        reasons,
        vec![RejectionReason::AnswerMismatch, RejectionReason::AnswerMissing]
    );
}

#[test]
fn test_document_source_lookup() {
    let temp = TempDir::new().unwrap();
    let kb_dir = temp.path().join("kb");
    std::fs::create_dir_all(kb_dir.join("faq")).unwrap();
    std::fs::write(
        kb_dir.join("faq/colors.md"),
        format!("---\ntitle: Colors\n---\n{}", DOCUMENT),
    )
    .unwrap();

    let source = CachedSource::new(KbStore::new(&kb_dir));
    let batch = pairs(json!([
        {"query": "What color is the sky?", "citation": "The sky is blue."},
    ]));
    let validator = BatchValidator::citations();

    let outcome = validator
        .validate_document(&source, "faq/colors.md", &batch, &[])
        .unwrap();
    assert_eq!(outcome.valid[0].end_index, Some(16));

    let err = validator
        .validate_document(&source, "faq/missing.md", &batch, &[])
        .unwrap_err();
    match err {
        ValidationError::DocumentUnavailable { doc_id } => assert_eq!(doc_id, "faq/missing.md"),
    }
}

#[test]
fn test_in_memory_source() {
    let mut docs = HashMap::new();
    docs.insert("colors".to_string(), DOCUMENT.to_string());

    let batch = pairs(json!([
        {"query": "What color is the grass?", "citation": "Grass  is green."},
    ]));

    let outcome = BatchValidator::citations()
        .validate_document(&docs, "colors", &batch, &[])
        .unwrap();
    assert_eq!(outcome.valid[0].span().unwrap().slice(DOCUMENT), "Grass is green.");
}
