//! Outcome of a single scoring variant.

use crate::score::{CriterionScore, Provenance};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a variant produced no score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The provider answered but the output could not be turned into a score
    Parse {
        /// Parser diagnostic
        message: String,
    },
    /// Every attempt hit a transient error
    RetriesExhausted {
        /// Attempts made
        attempts: u32,
        /// Last transient error seen
        last_error: String,
    },
    /// The provider rejected the request outright
    Provider {
        /// Provider diagnostic
        message: String,
    },
    /// The evaluation was cancelled before the variant finished
    Cancelled,
    /// The task running the variant panicked or was aborted
    TaskFailed {
        /// Join error description
        message: String,
    },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Parse { message } => write!(f, "parse error: {}", message),
            FailureReason::RetriesExhausted {
                attempts,
                last_error,
            } => write!(f, "gave up after {} attempts: {}", attempts, last_error),
            FailureReason::Provider { message } => write!(f, "provider error: {}", message),
            FailureReason::Cancelled => f.write_str("cancelled"),
            FailureReason::TaskFailed { message } => write!(f, "task failed: {}", message),
        }
    }
}

/// Result of one scoring attempt; immutable once produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VariantOutcome {
    /// The variant produced a valid score (carrying its provenance)
    Success {
        /// The parsed score
        score: CriterionScore,
    },
    /// The variant failed
    Failure {
        /// Which provider/variant failed
        provenance: Provenance,
        /// Why it failed
        reason: FailureReason,
    },
}

impl VariantOutcome {
    /// Wrap a successful score, tagging it with its provenance
    pub fn success(score: CriterionScore, provenance: Provenance) -> Self {
        VariantOutcome::Success {
            score: score.with_provenance(provenance),
        }
    }

    /// Record a failure
    pub fn failure(provenance: Provenance, reason: FailureReason) -> Self {
        VariantOutcome::Failure { provenance, reason }
    }

    /// Whether the variant succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, VariantOutcome::Success { .. })
    }

    /// The score, if the variant succeeded
    pub fn score(&self) -> Option<&CriterionScore> {
        match self {
            VariantOutcome::Success { score } => Some(score),
            VariantOutcome::Failure { .. } => None,
        }
    }

    /// The provenance of this outcome
    pub fn provenance(&self) -> Option<&Provenance> {
        match self {
            VariantOutcome::Success { score } => score.provenance(),
            VariantOutcome::Failure { provenance, .. } => Some(provenance),
        }
    }

    /// The failure reason, if the variant failed
    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            VariantOutcome::Success { .. } => None,
            VariantOutcome::Failure { reason, .. } => Some(reason),
        }
    }
}
