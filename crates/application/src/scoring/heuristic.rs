//! Deterministic, network-free scoring from token overlap.

use answer_grader_domain::{CriterionScore, SCORE_MAX};
use std::collections::HashSet;

/// Length ratio (candidate / expected) up to which conciseness is not penalized
pub const DEFAULT_LENGTH_TOLERANCE: f64 = 1.5;

/// Token-overlap scorer used when no provider produces a score.
///
/// - completeness: recall of expected tokens in the candidate
/// - correctness: F1 of the two token sets
/// - conciseness: full marks up to the length tolerance, then inversely
///   proportional to how much longer the candidate is
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicScorer {
    length_tolerance: f64,
}

impl Default for HeuristicScorer {
    fn default() -> Self {
        Self {
            length_tolerance: DEFAULT_LENGTH_TOLERANCE,
        }
    }
}

impl HeuristicScorer {
    /// Create a scorer with the default length tolerance
    pub fn new() -> Self {
        Self::default()
    }

    /// Score `candidate` against `expected`. Always succeeds.
    pub fn score(&self, expected: &str, candidate: &str) -> CriterionScore {
        let expected_tokens = tokenize(expected);
        let candidate_tokens = tokenize(candidate);
        if expected_tokens.is_empty() || candidate_tokens.is_empty() {
            return CriterionScore::lowest();
        }

        let expected_set: HashSet<&str> = expected_tokens.iter().map(String::as_str).collect();
        let candidate_set: HashSet<&str> = candidate_tokens.iter().map(String::as_str).collect();
        let shared = expected_set.intersection(&candidate_set).count() as f64;

        let recall = shared / expected_set.len() as f64;
        let precision = shared / candidate_set.len() as f64;
        let f1 = if shared == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };

        let length_ratio = candidate_tokens.len() as f64 / expected_tokens.len() as f64;
        let conciseness = (self.length_tolerance / length_ratio).min(1.0);

        CriterionScore::new(scale(recall), scale(conciseness), scale(f1))
            .unwrap_or_else(|_| CriterionScore::lowest())
    }
}

fn scale(fraction: f64) -> f64 {
    (fraction * SCORE_MAX).clamp(0.0, SCORE_MAX)
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reordered_answer_scores_full_marks() {
        let score = HeuristicScorer::new().score(
            "The capital of France is Paris.",
            "Paris is the capital of France.",
        );
        assert_eq!(score.completeness(), 5.0);
        assert_eq!(score.correctness(), 5.0);
        assert_eq!(score.conciseness(), 5.0);
        assert!(score.provenance().is_none());
    }

    #[test]
    fn test_unrelated_answer_scores_zero_overlap() {
        let score = HeuristicScorer::new().score("Paris", "Berlin");
        assert_eq!(score.completeness(), 0.0);
        assert_eq!(score.correctness(), 0.0);
    }

    #[test]
    fn test_partial_answer() {
        // 2 of 4 expected tokens present, candidate has 2 tokens
        let score = HeuristicScorer::new().score("red green blue yellow", "red green");
        assert!((score.completeness() - 2.5).abs() < 1e-9);
        // precision 1.0, recall 0.5 -> F1 2/3
        assert!((score.correctness() - 5.0 * 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(score.conciseness(), 5.0);
    }

    #[test]
    fn test_verbose_answer_loses_conciseness() {
        let expected = "Paris";
        let candidate = "Well it is certainly the case that the answer is Paris";
        let score = HeuristicScorer::new().score(expected, candidate);
        assert_eq!(score.completeness(), 5.0);
        assert!(score.conciseness() < 1.0);
    }

    #[test]
    fn test_empty_input_scores_zero() {
        let scorer = HeuristicScorer::new();
        assert_eq!(scorer.score("Paris", ""), CriterionScore::lowest());
        assert_eq!(scorer.score("", "Paris"), CriterionScore::lowest());
        assert_eq!(scorer.score("...", "!!!"), CriterionScore::lowest());
    }

    #[test]
    fn test_is_deterministic() {
        let scorer = HeuristicScorer::new();
        let a = scorer.score("one two three", "three two zero");
        let b = scorer.score("one two three", "three two zero");
        assert_eq!(a, b);
    }
}
