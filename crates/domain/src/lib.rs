//! Answer Grader Domain Types
//!
//! This crate provides the core domain model for grading free-text answers on
//! completeness, conciseness and correctness. It defines validated score
//! triples, weights, variant outcomes, evaluation results, and the capability
//! interface every scoring provider implements.
//!
//! ## Architecture
//!
//! - **identifiers**: Evaluation IDs and provider names
//! - **score**: Validated criterion scores and provenance
//! - **weights**: Raw and normalized criterion weights
//! - **outcome**: Result of a single scoring variant
//! - **result**: Aggregated evaluation result
//! - **provider**: Provider capability trait and error taxonomy
//! - **errors**: Score and configuration errors
//!
//! ## Usage
//!
//! ```rust
//! use answer_grader_domain::{CriterionScore, RawWeights, Weights};
//!
//! let score = CriterionScore::new(4.0, 3.0, 5.0).unwrap();
//! let weights = Weights::normalize(RawWeights::new(0.6, 0.4, 1.0)).unwrap();
//! assert!((weights.apply(&score) - 4.3).abs() < 1e-9);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod identifiers;
pub mod outcome;
pub mod provider;
pub mod result;
pub mod score;
pub mod weights;

pub use errors::{ConfigError, ConfigResult, ScoreError};
pub use identifiers::{EvaluationId, ProviderName};
pub use outcome::{FailureReason, VariantOutcome};
pub use provider::{ProviderError, ScoringProvider, ScoringRequest, DEFAULT_TEMPERATURE};
pub use result::{EvaluationResult, VariantFailure};
pub use score::{Criterion, CriterionScore, Provenance, SCORE_MAX, SCORE_MIN};
pub use weights::{RawWeights, Weights};
