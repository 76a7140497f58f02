//! Error types for the grading domain.
//!
//! Score errors are raised while constructing a [`CriterionScore`](crate::score::CriterionScore);
//! configuration errors are raised while resolving weights and engine settings,
//! always before any provider is contacted.

use crate::score::Criterion;

/// Errors raised when a score triple fails validation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    /// A criterion value was outside the closed 0..=5 interval
    #[error("{criterion} score {value} is outside [{min}, {max}]")]
    OutOfRange {
        /// Offending criterion
        criterion: Criterion,
        /// Value that was rejected
        value: f64,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// A criterion value was NaN or infinite
    #[error("{criterion} score is not a finite number")]
    NotFinite {
        /// Offending criterion
        criterion: Criterion,
    },

    /// A criterion value was absent
    #[error("{0} score is missing")]
    Missing(Criterion),
}

/// Errors detected while resolving configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// All three weights were zero
    #[error("Scoring weights sum to zero; at least one criterion must carry weight")]
    ZeroWeightSum,

    /// A weight was negative
    #[error("Weight for {criterion} is negative ({value})")]
    NegativeWeight {
        /// Offending criterion
        criterion: Criterion,
        /// Value that was rejected
        value: f64,
    },

    /// A weight was NaN or infinite
    #[error("Weight for {0} is not a finite number")]
    NonFiniteWeight(Criterion),

    /// Variant count was zero
    #[error("variants_per_provider must be at least 1")]
    NoVariants,

    /// Provider concurrency limit was zero
    #[error("Provider '{0}' must allow at least one concurrent call")]
    ZeroConcurrency(String),

    /// Retry ceiling was zero
    #[error("Retry ceiling must allow at least one attempt")]
    NoAttempts,

    /// A provider was enabled that the engine does not know about
    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),

    /// The same provider was registered twice
    #[error("Provider '{0}' is registered more than once")]
    DuplicateProvider(String),

    /// Catch-all for invalid values
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroWeightSum => "ZERO_WEIGHT_SUM",
            Self::NegativeWeight { .. } => "NEGATIVE_WEIGHT",
            Self::NonFiniteWeight(_) => "NON_FINITE_WEIGHT",
            Self::NoVariants => "NO_VARIANTS",
            Self::ZeroConcurrency(_) => "ZERO_CONCURRENCY",
            Self::NoAttempts => "NO_ATTEMPTS",
            Self::UnknownProvider(_) => "UNKNOWN_PROVIDER",
            Self::DuplicateProvider(_) => "DUPLICATE_PROVIDER",
            Self::Invalid(_) => "INVALID_CONFIGURATION",
        }
    }
}

/// Result alias for configuration resolution
pub type ConfigResult<T> = Result<T, ConfigError>;
