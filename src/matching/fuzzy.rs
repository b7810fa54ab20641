//! Fuzzy answer matching
//!
//! Used for answer-style validation, where an answer may be paraphrased or
//! reformatted rather than quoted. An answer is valid when it appears in the
//! document case-insensitively, or when some window of the document scores at
//! least `threshold` against it.
//!
//! The window scan costs O(window_sizes * document_length) ratio evaluations in
//! the worst case. A character-multiset upper bound, maintained incrementally as
//! the window slides, skips windows that can neither reach the threshold nor
//! beat the best score so far, so most offsets never pay for a full ratio.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::similarity::{normalize, MatchIndex};

/// Default similarity an answer window must reach
pub const DEFAULT_ANSWER_THRESHOLD: f64 = 0.95;

/// Window lengths as fractions of the answer length, in scan order
const WINDOW_SCALES: [f64; 3] = [1.0, 0.9, 1.1];

/// Outcome of a fuzzy answer check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuzzyMatch {
    pub valid: bool,
    /// `1.0` for a substring hit, otherwise the score that crossed the
    /// threshold or the best window score seen
    pub score: f64,
}

impl FuzzyMatch {
    fn valid(score: f64) -> Self {
        Self { valid: true, score }
    }

    fn invalid(score: f64) -> Self {
        Self { valid: false, score }
    }
}

/// Check whether `answer` is supported by `document`
pub fn check_answer(answer: &str, document: &str, threshold: f64) -> FuzzyMatch {
    let candidate = normalize(answer);
    let haystack = normalize(document);

    if candidate.is_empty() || haystack.is_empty() {
        return FuzzyMatch::invalid(0.0);
    }
    if haystack.contains(&candidate) {
        return FuzzyMatch::valid(1.0);
    }

    let candidate: Vec<char> = candidate.chars().collect();
    let haystack: Vec<char> = haystack.chars().collect();
    let index = MatchIndex::new(&candidate);
    let mut best = 0.0;
    let mut scanned = Vec::with_capacity(WINDOW_SCALES.len());

    for scale in WINDOW_SCALES {
        let size = ((candidate.len() as f64 * scale) as usize).min(haystack.len());
        if size == 0 || scanned.contains(&size) {
            continue;
        }
        scanned.push(size);

        if let Some(score) = scan_windows(&index, &candidate, &haystack, size, threshold, &mut best)
        {
            return FuzzyMatch::valid(score);
        }
    }

    FuzzyMatch::invalid(best)
}

/// Slide a window of `size` chars across `haystack`
///
/// Returns the first score reaching `threshold`; otherwise updates `best`.
fn scan_windows(
    index: &MatchIndex<'_>,
    candidate: &[char],
    haystack: &[char],
    size: usize,
    threshold: f64,
    best: &mut f64,
) -> Option<f64> {
    let total = (candidate.len() + size) as f64;
    let mut overlap = CharOverlap::new(candidate);

    for &c in &haystack[..size] {
        overlap.add(c);
    }

    for offset in 0..=(haystack.len() - size) {
        if offset > 0 {
            overlap.remove(haystack[offset - 1]);
            overlap.add(haystack[offset + size - 1]);
        }

        let upper = 2.0 * overlap.shared as f64 / total;
        if upper < threshold && upper <= *best {
            continue;
        }

        let score = index.symmetric_ratio(&haystack[offset..offset + size]);
        if score > *best {
            *best = score;
        }
        if score >= threshold {
            return Some(score);
        }
    }

    None
}

/// Size of the multiset intersection between a window and the candidate
struct CharOverlap {
    wanted: HashMap<char, usize>,
    held: HashMap<char, usize>,
    shared: usize,
}

impl CharOverlap {
    fn new(candidate: &[char]) -> Self {
        let mut wanted = HashMap::new();
        for &c in candidate {
            *wanted.entry(c).or_insert(0) += 1;
        }
        Self {
            wanted,
            held: HashMap::new(),
            shared: 0,
        }
    }

    fn add(&mut self, c: char) {
        let held = self.held.entry(c).or_insert(0);
        *held += 1;
        if *held <= self.wanted.get(&c).copied().unwrap_or(0) {
            self.shared += 1;
        }
    }

    fn remove(&mut self, c: char) {
        if let Some(held) = self.held.get_mut(&c) {
            if *held <= self.wanted.get(&c).copied().unwrap_or(0) {
                self.shared -= 1;
            }
            *held -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "Refunds are issued within 14 days of the return being received.\n\
                       Shipping is free on orders over $50.";

    #[test]
    fn test_case_insensitive_substring() {
        let result = check_answer("SHIPPING IS FREE", DOC, DEFAULT_ANSWER_THRESHOLD);
        assert_eq!(result, FuzzyMatch::valid(1.0));
    }

    #[test]
    fn test_whitespace_reformatted_substring() {
        let result = check_answer("received.   Shipping", DOC, DEFAULT_ANSWER_THRESHOLD);
        assert!(result.valid);
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn test_near_match_passes_lower_threshold() {
        let result = check_answer("Refunds are issued within 15 days", DOC, 0.9);
        assert!(result.valid);
        assert!(result.score >= 0.9 && result.score < 1.0);
    }

    #[test]
    fn test_unrelated_answer_reports_best_score() {
        let result = check_answer("quantum chromodynamics lecture", DOC, DEFAULT_ANSWER_THRESHOLD);
        assert!(!result.valid);
        assert!(result.score > 0.0 && result.score < DEFAULT_ANSWER_THRESHOLD);
    }

    #[test]
    fn test_answer_longer_than_document() {
        let result = check_answer("free shipping on all orders", "free shipping", 0.95);
        assert!(!result.valid);
        assert!(result.score > 0.5);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(check_answer("", DOC, 0.5), FuzzyMatch::invalid(0.0));
        assert_eq!(check_answer("answer", "  ", 0.5), FuzzyMatch::invalid(0.0));
    }

    #[test]
    fn test_overlap_tracks_sliding_window() {
        let candidate: Vec<char> = "aab".chars().collect();
        let mut overlap = CharOverlap::new(&candidate);
        for c in "aaa".chars() {
            overlap.add(c);
        }
        assert_eq!(overlap.shared, 2);

        overlap.remove('a');
        overlap.add('b');
        assert_eq!(overlap.shared, 3);

        overlap.remove('x');
        assert_eq!(overlap.shared, 3);
    }
}
