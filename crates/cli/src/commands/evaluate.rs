//! Grade a single answer

use super::CommandContext;
use answer_grader_application::EvaluationRequest;
use answer_grader_domain::EvaluationResult;
use anyhow::{Context, Result};

/// Arguments of the `evaluate` command
#[derive(Debug, Clone)]
pub struct EvaluateArgs {
    /// Identifier echoed on the result
    pub question_id: String,
    /// Question text shown to the providers
    pub question: String,
    /// Reference answer
    pub expected: String,
    /// Answer being graded
    pub candidate: String,
}

impl From<EvaluateArgs> for EvaluationRequest {
    fn from(args: EvaluateArgs) -> Self {
        EvaluationRequest::new(args.question_id, args.question, args.expected, args.candidate)
    }
}

/// Evaluate one answer and return the result
pub async fn run(ctx: &CommandContext, args: EvaluateArgs) -> Result<EvaluationResult> {
    let request = EvaluationRequest::from(args);
    let result = ctx
        .engine
        .evaluate_with_cancel(&request, &ctx.evaluation, &ctx.cancel)
        .await
        .with_context(|| format!("Evaluation of '{}' failed", request.question_id))?;

    if result.heuristic_fallback {
        tracing::warn!(
            question_id = %request.question_id,
            failures = result.failures.len(),
            "No provider produced a score, heuristic fallback used"
        );
    }
    Ok(result)
}
