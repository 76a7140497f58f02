//! Submission grading - many answers, one shared engine
//!
//! A submission is graded by running one evaluation per answer concurrently.
//! All evaluations go through the same engine, so they share its provider
//! gates and together never exceed any provider's ceiling.

use crate::scoring::{EvaluationConfig, EvaluationEngine, EvaluationRequest};
use crate::ApplicationResult;
use answer_grader_domain::EvaluationResult;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Hard ceiling on answers graded at once
pub const MAX_CONCURRENT_ANSWERS_CAP: usize = 16;

/// Results for a whole submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReport {
    /// Per-answer results, in input order
    pub results: Vec<EvaluationResult>,
    /// Mean of the final scores; 0.0 for an empty submission
    pub mean_final_score: f64,
    /// Answers scored by the heuristic fallback
    pub heuristic_fallback_count: usize,
}

impl SubmissionReport {
    fn from_results(results: Vec<EvaluationResult>) -> Self {
        let mean_final_score = if results.is_empty() {
            0.0
        } else {
            results.iter().map(|r| r.final_score).sum::<f64>() / results.len() as f64
        };
        let heuristic_fallback_count = results.iter().filter(|r| r.heuristic_fallback).count();
        Self {
            results,
            mean_final_score,
            heuristic_fallback_count,
        }
    }
}

/// Grades every answer of a submission
pub struct SubmissionGrader {
    engine: Arc<EvaluationEngine>,
    max_concurrent_answers: usize,
}

impl SubmissionGrader {
    /// Create a grader; the requested concurrency is clamped to `1..=MAX_CONCURRENT_ANSWERS_CAP`
    pub fn new(engine: Arc<EvaluationEngine>, max_concurrent_answers: usize) -> Self {
        Self {
            engine,
            max_concurrent_answers: max_concurrent_answers.clamp(1, MAX_CONCURRENT_ANSWERS_CAP),
        }
    }

    /// Effective answer concurrency
    pub fn max_concurrent_answers(&self) -> usize {
        self.max_concurrent_answers
    }

    /// Grade `items` with the engine's default configuration
    pub async fn grade(&self, items: Vec<EvaluationRequest>) -> ApplicationResult<SubmissionReport> {
        self.grade_with_cancel(items, self.engine.config(), &CancellationToken::new())
            .await
    }

    /// Grade `items`, stopping at the first configuration error or on cancellation
    #[instrument(skip(self, items, config, cancel), fields(answers = items.len()))]
    pub async fn grade_with_cancel(
        &self,
        items: Vec<EvaluationRequest>,
        config: &EvaluationConfig,
        cancel: &CancellationToken,
    ) -> ApplicationResult<SubmissionReport> {
        let engine = &self.engine;
        let results: Vec<EvaluationResult> = stream::iter(items)
            .map(|request| async move {
                engine.evaluate_with_cancel(&request, config, cancel).await
            })
            .buffered(self.max_concurrent_answers)
            .try_collect()
            .await?;

        let report = SubmissionReport::from_results(results);
        info!(
            answers = report.results.len(),
            mean_final_score = report.mean_final_score,
            heuristic_fallback_count = report.heuristic_fallback_count,
            "Submission graded"
        );
        Ok(report)
    }
}
