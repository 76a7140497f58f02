//! Application layer for the answer grader
//!
//! This crate hosts the evaluation orchestration engine.
//!
//! ## Architecture
//!
//! The application layer sits between the domain types and the infrastructure
//! providers. It only sees providers through the `ScoringProvider` trait.
//!
//! ## Modules
//!
//! - `scoring` - Dispatch, gating, retry, parsing, aggregation and the engine façade
//! - `grading` - Concurrent grading of every answer in a submission

pub mod grading;
pub mod scoring;

// Re-export commonly used types
pub use grading::{SubmissionGrader, SubmissionReport, MAX_CONCURRENT_ANSWERS_CAP};
pub use scoring::{
    EvaluationConfig, EvaluationEngine, EvaluationEngineBuilder, EvaluationMode,
    EvaluationRequest, GateStats, HeuristicScorer,
};

use answer_grader_domain::ConfigError;
use thiserror::Error;

/// Application-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApplicationError {
    /// The configuration cannot produce a meaningful evaluation
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The caller cancelled the evaluation
    #[error("Evaluation cancelled")]
    Cancelled,
}

impl ApplicationError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApplicationError::Cancelled)
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            ApplicationError::Configuration(err) => err.error_code(),
            ApplicationError::Cancelled => "CANCELLED",
        }
    }
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;
