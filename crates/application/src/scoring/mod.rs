//! Scoring module - Evaluation orchestration engine
//!
//! This module fans a question/answer pair out to scoring variants across
//! providers, bounds concurrency per provider, retries transient failures,
//! and reduces the outcomes to one weighted score.

mod aggregator;
mod config;
mod dispatcher;
mod engine;
mod gate;
mod heuristic;
mod parse;
mod prompt;
mod request;
mod variant;

pub use aggregator::{median, median_score, Aggregator};
pub use config::EvaluationConfig;
pub use dispatcher::{Dispatcher, MAX_IN_FLIGHT_CAP};
pub use engine::{EvaluationEngine, EvaluationEngineBuilder, DEFAULT_MAX_IN_FLIGHT};
pub use gate::{GatePermit, GateStats, ProviderGate};
pub use heuristic::{HeuristicScorer, DEFAULT_LENGTH_TOLERANCE};
pub use parse::{parse_scores, ParseError};
pub use prompt::{build_prompt, phrasing_count, variant_seed};
pub use request::{EvaluationMode, EvaluationRequest};
pub use variant::VariantClient;
