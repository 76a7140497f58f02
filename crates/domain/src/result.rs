//! Evaluation results handed back to callers.

use crate::identifiers::EvaluationId;
use crate::outcome::FailureReason;
use crate::score::{CriterionScore, Provenance};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A failed variant, kept on the result for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantFailure {
    /// Which provider/variant failed
    pub provenance: Provenance,
    /// Why it failed
    pub reason: FailureReason,
}

/// Final, aggregated grade for one question/answer pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Identifier of the evaluate() call that produced this result
    pub evaluation_id: EvaluationId,
    /// Caller-supplied question identifier
    pub question_id: String,
    /// Per-criterion aggregate (no provenance)
    pub scores: CriterionScore,
    /// Weighted final score in [0, 5]
    pub final_score: f64,
    /// Variants that produced a valid score
    pub success_count: usize,
    /// Variants dispatched
    pub attempted_count: usize,
    /// Whether the heuristic scorer produced `scores`
    pub heuristic_fallback: bool,
    /// Failed variants, in completion order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<VariantFailure>,
    /// When the result was produced
    pub evaluated_at: DateTime<Utc>,
}

impl EvaluationResult {
    /// Fraction of dispatched variants that succeeded; 0.0 when nothing was dispatched
    pub fn success_ratio(&self) -> f64 {
        if self.attempted_count == 0 {
            return 0.0;
        }
        self.success_count as f64 / self.attempted_count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(success_count: usize, attempted_count: usize) -> EvaluationResult {
        EvaluationResult {
            evaluation_id: EvaluationId::new(),
            question_id: "q1".to_string(),
            scores: CriterionScore::new(4.0, 4.0, 4.0).unwrap(),
            final_score: 4.0,
            success_count,
            attempted_count,
            heuristic_fallback: false,
            failures: Vec::new(),
            evaluated_at: Utc::now(),
        }
    }

    #[test]
    fn test_success_ratio() {
        assert_eq!(result(3, 4).success_ratio(), 0.75);
        assert_eq!(result(0, 0).success_ratio(), 0.0);
    }

    #[test]
    fn test_empty_failures_not_serialized() {
        let json = serde_json::to_value(result(1, 1)).unwrap();
        assert!(json.get("failures").is_none());
        assert_eq!(json["question_id"], "q1");
    }
}
