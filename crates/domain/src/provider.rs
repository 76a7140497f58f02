//! Provider capability interface.
//!
//! Every external scoring backend implements [`ScoringProvider`]. The engine only
//! sees raw text or a [`ProviderError`] that says whether a retry could help.

use crate::identifiers::ProviderName;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Temperature used for every scoring call unless configured otherwise
pub const DEFAULT_TEMPERATURE: f64 = 0.0;

/// A single scoring call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRequest {
    /// Rubric, calibration and answer text
    pub prompt: String,
    /// Sampling temperature
    pub temperature: f64,
    /// Deterministic seed for providers that accept one
    pub seed: u64,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
}

impl ScoringRequest {
    /// Create a request with the default temperature and token budget
    pub fn new(prompt: impl Into<String>, seed: u64) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: DEFAULT_TEMPERATURE,
            seed,
            max_tokens: 256,
        }
    }

    /// Override the temperature
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Errors surfaced by a provider call
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// HTTP 429 or equivalent
    #[error("Rate limited{}", format_retry_after(.retry_after))]
    RateLimited {
        /// Server-suggested wait, if any
        retry_after: Option<Duration>,
    },

    /// Server-side failure (5xx)
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Could not reach the provider
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The call timed out
    #[error("Request timed out")]
    Timeout,

    /// Credentials rejected (401/403)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request rejected as malformed (other 4xx)
    #[error("Bad request ({status}): {message}")]
    BadRequest {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// The response envelope could not be read
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The request could not be built (bad base URL, unsupported scheme)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Whether retrying the same call might succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. }
                | ProviderError::Server { .. }
                | ProviderError::Connection(_)
                | ProviderError::Timeout
        )
    }

    /// Server-requested wait before the next call, if the error carries one
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

fn format_retry_after(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(delay) => format!(" (retry after {:?})", delay),
        None => String::new(),
    }
}

/// An external scoring backend
#[async_trait]
pub trait ScoringProvider: Send + Sync {
    /// Name used for gating and provenance
    fn name(&self) -> &ProviderName;

    /// Issue one scoring call and return the raw model output
    async fn score(&self, request: &ScoringRequest) -> Result<String, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::RateLimited { retry_after: None }.is_transient());
        assert!(ProviderError::Server {
            status: 503,
            message: "unavailable".into()
        }
        .is_transient());
        assert!(ProviderError::Connection("reset".into()).is_transient());
        assert!(ProviderError::Timeout.is_transient());

        assert!(!ProviderError::Unauthorized("bad key".into()).is_transient());
        assert!(!ProviderError::BadRequest {
            status: 400,
            message: "bad".into()
        }
        .is_transient());
        assert!(!ProviderError::InvalidResponse("no choices".into()).is_transient());
        assert!(!ProviderError::InvalidRequest("relative URL without a base".into()).is_transient());
    }

    #[test]
    fn test_request_defaults() {
        let request = ScoringRequest::new("grade this", 9);
        assert_eq!(request.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(request.seed, 9);
        assert_eq!(request.with_temperature(0.2).temperature, 0.2);
    }

    #[test]
    fn test_rate_limited_message() {
        let err = ProviderError::RateLimited {
            retry_after: Some(Duration::from_secs(2)),
        };
        assert_eq!(err.to_string(), "Rate limited (retry after 2s)");
        assert_eq!(
            ProviderError::RateLimited { retry_after: None }.to_string(),
            "Rate limited"
        );
    }

    #[test]
    fn test_retry_after_hint() {
        let err = ProviderError::RateLimited {
            retry_after: Some(Duration::from_secs(30)),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(30)));
        assert_eq!(ProviderError::Timeout.retry_after(), None);
    }
}
