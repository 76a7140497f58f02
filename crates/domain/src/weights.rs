//! Criterion weights.
//!
//! Callers supply [`RawWeights`] in any scale; [`Weights::normalize`] turns them
//! into fractions summing to 1.0. Normalization happens once, when the
//! evaluation configuration is resolved.

use crate::errors::{ConfigError, ConfigResult};
use crate::score::{Criterion, CriterionScore, SCORE_MAX, SCORE_MIN};
use serde::{Deserialize, Serialize};

/// Un-normalized weights as supplied by configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawWeights {
    /// Weight for completeness
    pub completeness: f64,
    /// Weight for conciseness
    pub conciseness: f64,
    /// Weight for correctness
    pub correctness: f64,
}

impl RawWeights {
    /// Create raw weights
    pub fn new(completeness: f64, conciseness: f64, correctness: f64) -> Self {
        Self {
            completeness,
            conciseness,
            correctness,
        }
    }

    fn get(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::Completeness => self.completeness,
            Criterion::Conciseness => self.conciseness,
            Criterion::Correctness => self.correctness,
        }
    }
}

impl Default for RawWeights {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
}

/// Normalized weights; the three fields always sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Weights {
    completeness: f64,
    conciseness: f64,
    correctness: f64,
}

impl Weights {
    /// Normalize raw weights so they sum to 1.0.
    ///
    /// Fails on negative or non-finite input and when every weight is zero.
    pub fn normalize(raw: RawWeights) -> ConfigResult<Self> {
        for criterion in Criterion::ALL {
            let value = raw.get(criterion);
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteWeight(criterion));
            }
            if value < 0.0 {
                return Err(ConfigError::NegativeWeight { criterion, value });
            }
        }

        let sum = raw.completeness + raw.conciseness + raw.correctness;
        if sum <= 0.0 {
            return Err(ConfigError::ZeroWeightSum);
        }

        Ok(Self {
            completeness: raw.completeness / sum,
            conciseness: raw.conciseness / sum,
            correctness: raw.correctness / sum,
        })
    }

    /// Weight for a criterion
    pub fn get(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::Completeness => self.completeness,
            Criterion::Conciseness => self.conciseness,
            Criterion::Correctness => self.correctness,
        }
    }

    /// Weighted sum of a score triple, clamped to the score range
    pub fn apply(&self, score: &CriterionScore) -> f64 {
        let total: f64 = Criterion::ALL
            .iter()
            .map(|c| score.get(*c) * self.get(*c))
            .sum();
        total.clamp(SCORE_MIN, SCORE_MAX)
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            completeness: 1.0 / 3.0,
            conciseness: 1.0 / 3.0,
            correctness: 1.0 / 3.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_example_weights() {
        let weights = Weights::normalize(RawWeights::new(0.6, 0.4, 1.0)).unwrap();
        assert!((weights.get(Criterion::Completeness) - 0.3).abs() < 1e-12);
        assert!((weights.get(Criterion::Conciseness) - 0.2).abs() < 1e-12);
        assert!((weights.get(Criterion::Correctness) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_sum_is_config_error() {
        assert_eq!(
            Weights::normalize(RawWeights::new(0.0, 0.0, 0.0)),
            Err(ConfigError::ZeroWeightSum)
        );
    }

    #[test]
    fn test_negative_and_nan_rejected() {
        assert!(matches!(
            Weights::normalize(RawWeights::new(-1.0, 1.0, 1.0)),
            Err(ConfigError::NegativeWeight {
                criterion: Criterion::Completeness,
                ..
            })
        ));
        assert_eq!(
            Weights::normalize(RawWeights::new(1.0, f64::NAN, 1.0)),
            Err(ConfigError::NonFiniteWeight(Criterion::Conciseness))
        );
    }

    #[test]
    fn test_apply() {
        let weights = Weights::normalize(RawWeights::new(0.6, 0.4, 1.0)).unwrap();
        let score = CriterionScore::new(4.0, 2.0, 5.0).unwrap();
        // 0.3 * 4 + 0.2 * 2 + 0.5 * 5
        assert!((weights.apply(&score) - 4.1).abs() < 1e-9);
    }

    #[test]
    fn test_single_criterion_weight() {
        let weights = Weights::normalize(RawWeights::new(0.0, 0.0, 2.0)).unwrap();
        let score = CriterionScore::new(1.0, 1.0, 3.0).unwrap();
        assert!((weights.apply(&score) - 3.0).abs() < 1e-12);
    }
}
