//! Common utilities shared by the grader crates.
//!
//! This crate provides:
//! - Configuration management
//! - Telemetry and observability
//! - Retry logic with backoff, jitter and cancellation

pub mod config;
pub mod retry;
pub mod telemetry;

// Re-export commonly used types
pub use config::{
    EngineSettings, GraderConfig, ProviderKind, ProviderSettings, RetrySettings, TelemetryConfig,
};
pub use retry::{
    retry_with_hint, retry_with_predicate, ExponentialBackoff, RetryConfig, RetryError,
};
pub use telemetry::{init_from_config, init_tracing};

/// Common error type used throughout the crate
pub type Result<T> = std::result::Result<T, anyhow::Error>;
