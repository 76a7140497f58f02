//! Variant fan-out.
//!
//! The dispatcher turns one question/answer pair into
//! `variants_per_provider × providers` independent tasks, runs them under an
//! overall task cap (on top of the per-provider gates), and collects every
//! outcome. A failing or panicking task never stops its siblings.

use crate::scoring::prompt::{build_prompt, variant_seed};
use crate::scoring::request::EvaluationRequest;
use crate::scoring::variant::VariantClient;
use answer_grader_domain::{FailureReason, Provenance, VariantOutcome};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Hard ceiling on simultaneously running variant tasks per evaluation
pub const MAX_IN_FLIGHT_CAP: usize = 32;

/// Runs the variant tasks of one evaluation
#[derive(Debug, Clone)]
pub struct Dispatcher {
    max_in_flight: usize,
}

impl Dispatcher {
    /// Create a dispatcher; the requested task cap is clamped to `1..=MAX_IN_FLIGHT_CAP`
    pub fn new(requested_max_in_flight: usize) -> Self {
        let max_in_flight = requested_max_in_flight.clamp(1, MAX_IN_FLIGHT_CAP);
        if max_in_flight != requested_max_in_flight {
            debug!(
                requested = requested_max_in_flight,
                effective = max_in_flight,
                "Clamped dispatcher task cap"
            );
        }
        Self { max_in_flight }
    }

    /// Effective task cap
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Run every variant for `request` and return all outcomes in completion order.
    ///
    /// Returns only once every task has finished. Dropping the returned future
    /// aborts the outstanding tasks, which releases their gate slots.
    pub async fn dispatch(
        &self,
        request: &EvaluationRequest,
        variants_per_provider: u32,
        clients: &[Arc<VariantClient>],
        cancel: &CancellationToken,
    ) -> Vec<VariantOutcome> {
        let limit = Arc::new(Semaphore::new(self.max_in_flight));
        let mut tasks = JoinSet::new();
        let mut pending: Vec<Option<Provenance>> = Vec::new();

        for client in clients {
            for variant in 0..variants_per_provider {
                let provider = client.provider_name().clone();
                let seed = variant_seed(&provider, variant);
                let provenance = Provenance::new(provider, variant, seed);
                let prompt = build_prompt(
                    variant,
                    &request.question,
                    &request.expected_answer,
                    &request.candidate_answer,
                );

                let index = pending.len();
                pending.push(Some(provenance.clone()));

                let client = client.clone();
                let limit = limit.clone();
                let cancel = cancel.clone();
                tasks.spawn(async move {
                    let run = async {
                        let _slot = tokio::select! {
                            biased;
                            _ = cancel.cancelled() => {
                                return VariantOutcome::failure(provenance.clone(), FailureReason::Cancelled);
                            }
                            slot = limit.acquire_owned() => slot,
                        };
                        client.run(prompt, provenance.clone(), &cancel).await
                    };
                    let outcome = match AssertUnwindSafe(run).catch_unwind().await {
                        Ok(outcome) => outcome,
                        Err(panic) => VariantOutcome::failure(
                            provenance,
                            FailureReason::TaskFailed {
                                message: panic_message(panic.as_ref()),
                            },
                        ),
                    };
                    (index, outcome)
                });
            }
        }

        debug!(tasks = pending.len(), max_in_flight = self.max_in_flight, "Dispatched variants");

        let mut outcomes = Vec::with_capacity(pending.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    pending[index] = None;
                    outcomes.push(outcome);
                }
                Err(err) => error!(error = %err, "Variant task did not complete"),
            }
        }

        // Tasks that died without reporting back
        for provenance in pending.into_iter().flatten() {
            outcomes.push(VariantOutcome::failure(
                provenance,
                FailureReason::TaskFailed {
                    message: "task ended without an outcome".to_string(),
                },
            ));
        }

        outcomes
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "variant task panicked".to_string()
    }
}
