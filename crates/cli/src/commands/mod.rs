//! CLI commands

pub mod evaluate;
pub mod grade;

use answer_grader_application::{EvaluationConfig, EvaluationEngine, SubmissionGrader};
use answer_grader_common::GraderConfig;
use answer_grader_infrastructure::build_providers;
use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Context passed to all commands
pub struct CommandContext {
    /// Shared engine; its provider gates span every command invocation
    pub engine: Arc<EvaluationEngine>,
    /// Resolved per-evaluation configuration
    pub evaluation: EvaluationConfig,
    /// Answers graded concurrently by `grade`
    pub max_concurrent_answers: usize,
    /// Fired on ctrl-c
    pub cancel: CancellationToken,
    /// Pretty-print JSON output
    pub pretty: bool,
}

impl CommandContext {
    /// Build providers and the engine from loaded configuration
    pub fn new(config: &GraderConfig, heuristic_only: bool, pretty: bool) -> Result<Self> {
        let evaluation = EvaluationConfig::from_settings(&config.engine)
            .context("Invalid engine settings")?
            .with_heuristic_only(config.engine.heuristic_only || heuristic_only);

        let mut builder = EvaluationEngine::builder()
            .config(evaluation.clone())
            .max_in_flight(config.engine.max_in_flight);
        for configured in build_providers(config)? {
            builder = builder.provider(configured.provider, configured.max_concurrency);
        }
        let engine = builder.build().context("Failed to build evaluation engine")?;

        Ok(Self::with_engine(
            Arc::new(engine),
            evaluation,
            config.engine.max_concurrent_answers,
            pretty,
        ))
    }

    /// Wrap an already-built engine
    pub fn with_engine(
        engine: Arc<EvaluationEngine>,
        evaluation: EvaluationConfig,
        max_concurrent_answers: usize,
        pretty: bool,
    ) -> Self {
        Self {
            engine,
            evaluation,
            max_concurrent_answers,
            cancel: CancellationToken::new(),
            pretty,
        }
    }

    /// Batch grader sharing this context's engine
    pub fn grader(&self) -> SubmissionGrader {
        SubmissionGrader::new(self.engine.clone(), self.max_concurrent_answers)
    }

    /// Render a value as JSON
    pub fn render<T: Serialize>(&self, value: &T) -> Result<String> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.context("Failed to serialize output")
    }
}
