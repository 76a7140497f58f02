//! Reduction of variant outcomes into one evaluation result.

use crate::scoring::heuristic::HeuristicScorer;
use crate::scoring::request::EvaluationRequest;
use answer_grader_domain::{
    Criterion, CriterionScore, EvaluationId, EvaluationResult, VariantFailure, VariantOutcome,
    Weights,
};
use chrono::Utc;
use tracing::{debug, info};

/// Median of `values`; the mean of the two middle values for an even count, 0.0 when empty
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Per-criterion median of a non-empty set of scores
pub fn median_score(scores: &[&CriterionScore]) -> Option<CriterionScore> {
    if scores.is_empty() {
        return None;
    }
    let column = |criterion: Criterion| -> f64 {
        let values: Vec<f64> = scores.iter().map(|s| s.get(criterion)).collect();
        median(&values)
    };
    CriterionScore::new(
        column(Criterion::Completeness),
        column(Criterion::Conciseness),
        column(Criterion::Correctness),
    )
    .ok()
}

/// Collapses variant outcomes into an [`EvaluationResult`]
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    heuristic: HeuristicScorer,
}

impl Aggregator {
    /// Create an aggregator that falls back to `heuristic`
    pub fn new(heuristic: HeuristicScorer) -> Self {
        Self { heuristic }
    }

    /// Aggregate `outcomes` for `request`.
    ///
    /// Uses the per-criterion median of the successes, or the heuristic score
    /// when there are none.
    pub fn aggregate(
        &self,
        evaluation_id: EvaluationId,
        request: &EvaluationRequest,
        outcomes: Vec<VariantOutcome>,
        weights: &Weights,
    ) -> EvaluationResult {
        let attempted_count = outcomes.len();
        let mut successes = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                VariantOutcome::Success { score } => successes.push(score),
                VariantOutcome::Failure { provenance, reason } => {
                    failures.push(VariantFailure { provenance, reason })
                }
            }
        }

        let refs: Vec<&CriterionScore> = successes.iter().collect();
        let (scores, heuristic_fallback) = match median_score(&refs) {
            Some(scores) => (scores, false),
            None => {
                if attempted_count > 0 {
                    info!(
                        question_id = %request.question_id,
                        attempted = attempted_count,
                        "No variant succeeded, using heuristic scorer"
                    );
                }
                (
                    self.heuristic
                        .score(&request.expected_answer, &request.candidate_answer),
                    true,
                )
            }
        };

        let final_score = weights.apply(&scores);
        debug!(
            question_id = %request.question_id,
            final_score,
            successes = successes.len(),
            attempted = attempted_count,
            heuristic_fallback,
            "Aggregated evaluation"
        );

        EvaluationResult {
            evaluation_id,
            question_id: request.question_id.clone(),
            scores,
            final_score,
            success_count: successes.len(),
            attempted_count,
            heuristic_fallback,
            failures,
            evaluated_at: Utc::now(),
        }
    }
}
