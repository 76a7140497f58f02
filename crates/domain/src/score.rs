//! Criterion scores.
//!
//! A [`CriterionScore`] is the validated triple produced by a single scoring
//! attempt, the heuristic scorer, or the median aggregator. Every field is
//! guaranteed to lie in `[SCORE_MIN, SCORE_MAX]`; values outside that range are
//! rejected rather than clamped.

use crate::errors::ScoreError;
use crate::identifiers::ProviderName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest score any criterion can take
pub const SCORE_MIN: f64 = 0.0;

/// Highest score any criterion can take
pub const SCORE_MAX: f64 = 5.0;

/// One of the three grading criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Does the answer cover everything the expected answer covers?
    Completeness,
    /// Is the answer free of padding and digressions?
    Conciseness,
    /// Is what the answer states actually right?
    Correctness,
}

impl Criterion {
    /// All criteria in canonical order
    pub const ALL: [Criterion; 3] = [
        Criterion::Completeness,
        Criterion::Conciseness,
        Criterion::Correctness,
    ];

    /// Field name used in provider output and serialized results
    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::Completeness => "completeness",
            Criterion::Conciseness => "conciseness",
            Criterion::Correctness => "correctness",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a score came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provenance {
    /// Provider that produced the score
    pub provider: ProviderName,
    /// Prompt variant index within that provider's ensemble
    pub variant: u32,
    /// Seed sent with the request
    pub seed: u64,
}

impl Provenance {
    /// Create a provenance tag
    pub fn new(provider: ProviderName, variant: u32, seed: u64) -> Self {
        Self {
            provider,
            variant,
            seed,
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.provider, self.variant)
    }
}

/// A validated completeness/conciseness/correctness triple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCriterionScore")]
pub struct CriterionScore {
    completeness: f64,
    conciseness: f64,
    correctness: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    provenance: Option<Provenance>,
}

impl CriterionScore {
    /// Build a score triple, failing if any value is non-finite or out of range.
    pub fn new(completeness: f64, conciseness: f64, correctness: f64) -> Result<Self, ScoreError> {
        Ok(Self {
            completeness: check(Criterion::Completeness, completeness)?,
            conciseness: check(Criterion::Conciseness, conciseness)?,
            correctness: check(Criterion::Correctness, correctness)?,
            provenance: None,
        })
    }

    /// Build a score triple from optional values, failing on the first missing one.
    pub fn from_parts(
        completeness: Option<f64>,
        conciseness: Option<f64>,
        correctness: Option<f64>,
    ) -> Result<Self, ScoreError> {
        Self::new(
            completeness.ok_or(ScoreError::Missing(Criterion::Completeness))?,
            conciseness.ok_or(ScoreError::Missing(Criterion::Conciseness))?,
            correctness.ok_or(ScoreError::Missing(Criterion::Correctness))?,
        )
    }

    /// The all-zero triple
    pub fn lowest() -> Self {
        Self {
            completeness: SCORE_MIN,
            conciseness: SCORE_MIN,
            correctness: SCORE_MIN,
            provenance: None,
        }
    }

    /// Attach a provenance tag
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    /// Drop the provenance tag
    pub fn without_provenance(mut self) -> Self {
        self.provenance = None;
        self
    }

    /// Completeness score
    pub fn completeness(&self) -> f64 {
        self.completeness
    }

    /// Conciseness score
    pub fn conciseness(&self) -> f64 {
        self.conciseness
    }

    /// Correctness score
    pub fn correctness(&self) -> f64 {
        self.correctness
    }

    /// Score for a criterion by name
    pub fn get(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::Completeness => self.completeness,
            Criterion::Conciseness => self.conciseness,
            Criterion::Correctness => self.correctness,
        }
    }

    /// Provenance tag, absent for heuristic and aggregated scores
    pub fn provenance(&self) -> Option<&Provenance> {
        self.provenance.as_ref()
    }
}

fn check(criterion: Criterion, value: f64) -> Result<f64, ScoreError> {
    if !value.is_finite() {
        return Err(ScoreError::NotFinite { criterion });
    }
    if !(SCORE_MIN..=SCORE_MAX).contains(&value) {
        return Err(ScoreError::OutOfRange {
            criterion,
            value,
            min: SCORE_MIN,
            max: SCORE_MAX,
        });
    }
    Ok(value)
}

#[derive(Deserialize)]
struct RawCriterionScore {
    completeness: Option<f64>,
    conciseness: Option<f64>,
    correctness: Option<f64>,
    #[serde(default)]
    provenance: Option<Provenance>,
}

impl TryFrom<RawCriterionScore> for CriterionScore {
    type Error = ScoreError;

    fn try_from(raw: RawCriterionScore) -> Result<Self, Self::Error> {
        let score = Self::from_parts(raw.completeness, raw.conciseness, raw.correctness)?;
        Ok(match raw.provenance {
            Some(provenance) => score.with_provenance(provenance),
            None => score,
        })
    }
}
