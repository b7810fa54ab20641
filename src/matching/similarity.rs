//! String similarity and duplicate-question detection
//!
//! Similarity is the matching-blocks ratio `2 * M / (len(a) + len(b))`, where
//! `M` counts characters covered by the blocks found by recursively taking the
//! longest common substring (Ratcliff/Obershelp). Both sides are lower-cased
//! and whitespace-collapsed before comparison.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default similarity at which two questions are considered the same
pub const DEFAULT_QUESTION_THRESHOLD: f64 = 0.95;

/// Sequences at least this long stop indexing "popular" characters
const POPULAR_MIN_LEN: usize = 200;

/// Lower-case, collapse whitespace runs to single spaces, trim
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Similarity ratio in `[0, 1]` between two strings
///
/// Empty input on either side (after normalization) yields `0.0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = normalize(a).chars().collect();
    let b: Vec<char> = normalize(b).chars().collect();

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    MatchIndex::new(&b).symmetric_ratio(&a)
}

/// Position index over the second sequence of a comparison
///
/// Built once per `b` and reused across many `a` sequences.
pub(crate) struct MatchIndex<'b> {
    seq: &'b [char],
    positions: HashMap<char, Vec<usize>>,
}

impl<'b> MatchIndex<'b> {
    pub(crate) fn new(seq: &'b [char]) -> Self {
        let mut positions: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in seq.iter().enumerate() {
            positions.entry(c).or_default().push(j);
        }

        // Characters that make up more than 1% of a long sequence are not
        // indexed; matches can still extend across them.
        if seq.len() >= POPULAR_MIN_LEN {
            let limit = seq.len() / 100 + 1;
            positions.retain(|_, js| js.len() <= limit);
        }

        Self { seq, positions }
    }

    /// `2 * M / T` for `a` against the indexed sequence
    pub(crate) fn ratio(&self, a: &[char]) -> f64 {
        let total = a.len() + self.seq.len();
        if total == 0 {
            return 0.0;
        }
        2.0 * self.matching_characters(a) as f64 / total as f64
    }

    /// Larger of the two one-way ratios
    ///
    /// Greedy longest-match blocks depend on which side is indexed; the max
    /// does not, and is still `1.0` only for equal sequences.
    pub(crate) fn symmetric_ratio(&self, a: &[char]) -> f64 {
        let forward = self.ratio(a);
        if forward >= 1.0 {
            return forward;
        }
        forward.max(MatchIndex::new(a).ratio(self.seq))
    }

    /// Total size of all matching blocks between `a` and the indexed sequence
    pub(crate) fn matching_characters(&self, a: &[char]) -> usize {
        let mut matched = 0;
        let mut pending = vec![(0, a.len(), 0, self.seq.len())];

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let (i, j, k) = self.longest_match(a, alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            matched += k;
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                pending.push((i + k, ahi, j + k, bhi));
            }
        }

        matched
    }

    /// Longest common block of `a[alo..ahi]` and `b[blo..bhi]`
    ///
    /// Returns `(i, j, size)`. Ties go to the block starting earliest in `a`,
    /// then earliest in `b`.
    fn longest_match(
        &self,
        a: &[char],
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let b = self.seq;
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);

        // run length of the match ending at b[j], for the previous row of a
        let mut prev: HashMap<usize, usize> = HashMap::new();
        let mut curr: HashMap<usize, usize> = HashMap::new();

        for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
            curr.clear();
            if let Some(js) = self.positions.get(c) {
                for &j in js {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let run = match j {
                        0 => 0,
                        _ => prev.get(&(j - 1)).copied().unwrap_or(0),
                    };
                    let k = run + 1;
                    curr.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            std::mem::swap(&mut prev, &mut curr);
        }

        while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && a[best_i + best_size] == b[best_j + best_size]
        {
            best_size += 1;
        }

        (best_i, best_j, best_size)
    }
}

/// Result of checking a question against previously accepted questions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateCheck {
    pub is_duplicate: bool,
    /// The first history entry that met the threshold
    pub matched: Option<String>,
    /// Similarity to `matched`, `0.0` when not a duplicate
    pub score: f64,
}

impl DuplicateCheck {
    pub fn unique() -> Self {
        Self {
            is_duplicate: false,
            matched: None,
            score: 0.0,
        }
    }
}

/// Check a question against `history` in order
///
/// The FIRST entry scoring at or above `threshold` wins, not the best one.
pub fn is_duplicate(question: &str, history: &[String], threshold: f64) -> DuplicateCheck {
    find_duplicate(question, history.iter().map(String::as_str), threshold)
}

/// Same as [`is_duplicate`] over any ordered sequence of questions
pub fn find_duplicate<'a, I>(question: &str, history: I, threshold: f64) -> DuplicateCheck
where
    I: IntoIterator<Item = &'a str>,
{
    let question: Vec<char> = normalize(question).chars().collect();
    if question.is_empty() {
        return DuplicateCheck::unique();
    }

    for existing in history {
        let candidate: Vec<char> = normalize(existing).chars().collect();
        if candidate.is_empty() {
            continue;
        }

        let score = MatchIndex::new(&candidate).symmetric_ratio(&question);
        if score >= threshold {
            debug!(score, duplicate_of = existing, "Duplicate question detected");
            return DuplicateCheck {
                is_duplicate: true,
                matched: Some(existing.to_string()),
                score,
            };
        }
    }

    DuplicateCheck::unique()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_identical_strings() {
        assert_close(similarity("What color is the sky?", "What color is the sky?"), 1.0);
    }

    #[test]
    fn test_normalization_ignores_case_and_spacing() {
        assert_close(similarity("What  Color\nis the sky?", "what color is the sky?"), 1.0);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(similarity("", "x"), 0.0);
        assert_eq!(similarity("x", ""), 0.0);
        assert_eq!(similarity("", ""), 0.0);
        assert_eq!(similarity("   ", "\n"), 0.0);
    }

    #[test]
    fn test_known_ratios() {
        // blocks "ab" + "d" over 8 chars
        assert_close(similarity("abcd", "abed"), 0.75);
        // "a" only
        assert_close(similarity("abc", "xya"), 1.0 / 3.0);
        assert_close(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let pairs = [
            ("How do I reset my password?", "How can I reset my password?"),
            ("kitten", "sitting"),
            ("What is the refund policy", "Where is the refund policy page"),
            // greedy blocks differ by direction here
            ("cb ab", "aabcbbcb"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a), "{a:?} vs {b:?}");
        }
        assert_close(similarity("cb ab", "aabcbbcb"), 6.0 / 13.0);
    }

    /// Deterministic pseudo-random strings over a small alphabet
    fn generated_strings(count: usize, seed: u64) -> Vec<String> {
        let alphabet: Vec<char> = "ab c".chars().collect();
        let mut state = seed;
        let mut next = || {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as usize
        };

        (0..count)
            .map(|_| {
                let len = 1 + next() % 12;
                (0..len).map(|_| alphabet[next() % alphabet.len()]).collect()
            })
            .collect()
    }

    #[test]
    fn test_symmetry_over_generated_pairs() {
        let strings = generated_strings(60, 7);
        for a in &strings {
            for b in &strings {
                let ab = similarity(a, b);
                let ba = similarity(b, a);
                assert_eq!(ab, ba, "{a:?} vs {b:?}");
                assert!((0.0..=1.0).contains(&ab));
            }
        }
    }

    #[test]
    fn test_duplicate_decision_ignores_argument_order() {
        let strings = generated_strings(40, 99);
        for a in &strings {
            for b in &strings {
                let forward = is_duplicate(a, &[b.clone()], 0.6);
                let backward = is_duplicate(b, &[a.clone()], 0.6);
                assert_eq!(forward.is_duplicate, backward.is_duplicate);
                assert_eq!(forward.score, backward.score);
            }
        }
    }

    #[test]
    fn test_popular_characters_still_match_on_long_input() {
        let a = "a".repeat(250);
        assert_close(similarity(&a, &a), 1.0);
    }

    #[test]
    fn test_first_match_wins_over_best() {
        let history = vec![
            "What color is the sky today?".to_string(),
            "What color is the sky?".to_string(),
        ];
        let check = is_duplicate("What color is the sky?", &history, 0.8);
        assert!(check.is_duplicate);
        assert_eq!(check.matched.as_deref(), Some("What color is the sky today?"));
        assert!(check.score < 1.0);
    }

    #[test]
    fn test_not_duplicate_reports_zero() {
        let history = vec!["How tall is Everest?".to_string()];
        let check = is_duplicate("What color is the sky?", &history, DEFAULT_QUESTION_THRESHOLD);
        assert_eq!(check, DuplicateCheck::unique());
    }

    #[test]
    fn test_empty_question_is_never_duplicate() {
        let history = vec!["".to_string(), "anything".to_string()];
        assert!(!is_duplicate("", &history, 0.0).is_duplicate);
    }
}
