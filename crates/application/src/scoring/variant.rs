//! A single scoring attempt against one provider.

use crate::scoring::gate::ProviderGate;
use crate::scoring::parse::parse_scores;
use answer_grader_common::{retry_with_hint, RetryConfig, RetryError};
use answer_grader_domain::{
    FailureReason, ProviderError, ProviderName, Provenance, ScoringProvider, ScoringRequest,
    VariantOutcome,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Runs one prompt variant against one provider, holding that provider's gate
/// slot for the whole attempt including retries.
pub struct VariantClient {
    provider: Arc<dyn ScoringProvider>,
    gate: Arc<ProviderGate>,
    retry: RetryConfig,
    temperature: f64,
}

impl VariantClient {
    /// Create a client for `provider`, gated by `gate`
    pub fn new(
        provider: Arc<dyn ScoringProvider>,
        gate: Arc<ProviderGate>,
        retry: RetryConfig,
        temperature: f64,
    ) -> Self {
        Self {
            provider,
            gate,
            retry,
            temperature,
        }
    }

    /// Provider this client talks to
    pub fn provider_name(&self) -> &ProviderName {
        self.provider.name()
    }

    /// Run the variant to completion.
    ///
    /// Never fails: every error, including cancellation, becomes a failed
    /// [`VariantOutcome`]. The gate slot is released before this returns.
    pub async fn run(
        &self,
        prompt: String,
        provenance: Provenance,
        cancel: &CancellationToken,
    ) -> VariantOutcome {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return VariantOutcome::failure(provenance, FailureReason::Cancelled);
            }
            permit = self.gate.acquire() => permit,
        };
        let permit = match permit {
            Ok(permit) => permit,
            Err(err) => {
                return VariantOutcome::failure(
                    provenance,
                    FailureReason::TaskFailed {
                        message: err.to_string(),
                    },
                );
            }
        };

        let request = ScoringRequest::new(prompt, provenance.seed).with_temperature(self.temperature);
        let response = retry_with_hint(
            self.retry.clone(),
            cancel,
            || self.provider.score(&request),
            ProviderError::is_transient,
            ProviderError::retry_after,
        )
        .await;
        drop(permit);

        match response {
            Ok(raw) => match parse_scores(&raw) {
                Ok(score) => {
                    debug!(variant = %provenance, "Variant scored");
                    VariantOutcome::success(score, provenance)
                }
                Err(err) => {
                    warn!(variant = %provenance, error = %err, "Unparseable provider response");
                    VariantOutcome::failure(
                        provenance,
                        FailureReason::Parse {
                            message: err.to_string(),
                        },
                    )
                }
            },
            Err(err) => {
                let reason = failure_reason(err);
                warn!(variant = %provenance, reason = %reason, "Variant failed");
                VariantOutcome::failure(provenance, reason)
            }
        }
    }
}

fn failure_reason(err: RetryError<ProviderError>) -> FailureReason {
    match err {
        RetryError::Exhausted {
            attempts,
            last_error,
        } => FailureReason::RetriesExhausted {
            attempts,
            last_error: last_error.to_string(),
        },
        RetryError::Permanent { error, .. } => FailureReason::Provider {
            message: error.to_string(),
        },
        RetryError::Cancelled { .. } => FailureReason::Cancelled,
    }
}
