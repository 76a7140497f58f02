//! Grade every answer of a submission file

use super::CommandContext;
use answer_grader_application::{EvaluationRequest, SubmissionReport};
use anyhow::{Context, Result};
use std::path::Path;

/// Read a JSON array of evaluation requests
pub fn read_submission(path: &Path) -> Result<Vec<EvaluationRequest>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read submission file {}", path.display()))?;
    parse_submission(&raw).with_context(|| format!("Invalid submission file {}", path.display()))
}

/// Parse a submission document
pub fn parse_submission(raw: &str) -> Result<Vec<EvaluationRequest>> {
    let items: Vec<EvaluationRequest> = serde_json::from_str(raw)?;
    if items.is_empty() {
        anyhow::bail!("submission contains no answers");
    }
    Ok(items)
}

/// Grade a submission file
pub async fn run(ctx: &CommandContext, path: &Path) -> Result<SubmissionReport> {
    let items = read_submission(path)?;
    ctx.grader()
        .grade_with_cancel(items, &ctx.evaluation, &ctx.cancel)
        .await
        .context("Grading failed")
}
