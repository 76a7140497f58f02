//! Evaluation input.

use serde::{Deserialize, Serialize};

/// How an evaluation should be scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Use the configured providers, falling back to the heuristic when none succeed
    #[default]
    Auto,
    /// Never call a provider
    HeuristicOnly,
}

/// One question/answer pair to grade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// Caller-supplied question identifier
    pub question_id: String,
    /// Question text
    pub question: String,
    /// Reference answer
    pub expected_answer: String,
    /// Answer being graded
    pub candidate_answer: String,
    /// Scoring mode
    #[serde(default)]
    pub mode: EvaluationMode,
}

impl EvaluationRequest {
    /// Create a request in [`EvaluationMode::Auto`]
    pub fn new(
        question_id: impl Into<String>,
        question: impl Into<String>,
        expected_answer: impl Into<String>,
        candidate_answer: impl Into<String>,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            question: question.into(),
            expected_answer: expected_answer.into(),
            candidate_answer: candidate_answer.into(),
            mode: EvaluationMode::Auto,
        }
    }

    /// Force heuristic-only scoring
    pub fn heuristic_only(mut self) -> Self {
        self.mode = EvaluationMode::HeuristicOnly;
        self
    }
}
