//! Infrastructure layer for the answer grader
//!
//! This crate provides implementations for:
//! - OpenAI-compatible chat completion scoring
//! - Anthropic messages scoring
//! - Building the configured provider set from `GraderConfig`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use answer_grader_common::GraderConfig;
//! use answer_grader_infrastructure::providers::build_providers;
//!
//! let config = GraderConfig::load()?;
//! for configured in build_providers(&config)? {
//!     builder = builder.provider(configured.provider, configured.max_concurrency);
//! }
//! ```

pub mod providers;

pub use providers::{
    build_providers, build_providers_with, classify_status, AnthropicProvider, ConfiguredProvider,
    OpenAiProvider,
};
