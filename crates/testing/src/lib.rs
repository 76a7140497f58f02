//! Testing utilities for the answer grader
//!
//! This crate provides:
//! - Scripted in-memory scoring providers with call and concurrency accounting
//! - Fixtures for question/answer pairs and provider response bodies
//!
//! # Examples
//!
//! ```
//! use answer_grader_testing::{fixtures, ScriptedProvider};
//! use answer_grader_domain::ProviderError;
//!
//! let provider = ScriptedProvider::new("openai")
//!     .then_err(ProviderError::Timeout)
//!     .always_ok(fixtures::score_json(4.0, 3.0, 5.0));
//! assert_eq!(provider.calls(), 0);
//! ```

pub mod fixtures;
pub mod mocks;

// Re-export commonly used types
pub use mocks::*;

// Re-export testing dependencies for convenience
pub use proptest;
pub use wiremock;
