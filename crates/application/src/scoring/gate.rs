//! Per-provider concurrency gate.
//!
//! One [`ProviderGate`] exists per configured provider for the lifetime of the
//! engine. Every variant targeting that provider, from every concurrent
//! evaluation, must hold a [`GatePermit`] while it talks to the provider.

use answer_grader_domain::{ConfigError, ConfigResult, ProviderName};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tracing::trace;

#[derive(Debug, Default)]
struct GateCounters {
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    total_acquired: AtomicU64,
}

/// Snapshot of a gate's call accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GateStats {
    /// Configured ceiling
    pub max_concurrency: usize,
    /// Calls currently holding a permit
    pub in_flight: usize,
    /// Highest in-flight count observed
    pub peak_in_flight: usize,
    /// Permits handed out since construction
    pub total_acquired: u64,
}

/// Concurrency limiter for one provider
#[derive(Debug)]
pub struct ProviderGate {
    provider: ProviderName,
    max_concurrency: usize,
    semaphore: Arc<Semaphore>,
    counters: Arc<GateCounters>,
}

impl ProviderGate {
    /// Create a gate allowing `max_concurrency` simultaneous calls.
    pub fn new(provider: ProviderName, max_concurrency: usize) -> ConfigResult<Self> {
        if max_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency(provider.to_string()));
        }
        Ok(Self {
            provider,
            max_concurrency,
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            counters: Arc::new(GateCounters::default()),
        })
    }

    /// Provider this gate protects
    pub fn provider(&self) -> &ProviderName {
        &self.provider
    }

    /// Configured ceiling
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Wait for a free slot and reserve it.
    ///
    /// Waiters are served in arrival order. The slot is released when the
    /// returned permit is dropped, including when the holding task is aborted.
    pub async fn acquire(&self) -> Result<GatePermit, AcquireError> {
        let permit = self.semaphore.clone().acquire_owned().await?;

        let in_flight = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters
            .peak_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);
        self.counters.total_acquired.fetch_add(1, Ordering::Relaxed);

        trace!(provider = %self.provider, in_flight, "Gate slot acquired");

        Ok(GatePermit {
            counters: self.counters.clone(),
            _permit: permit,
        })
    }

    /// Current accounting snapshot
    pub fn stats(&self) -> GateStats {
        GateStats {
            max_concurrency: self.max_concurrency,
            in_flight: self.counters.in_flight.load(Ordering::SeqCst),
            peak_in_flight: self.counters.peak_in_flight.load(Ordering::SeqCst),
            total_acquired: self.counters.total_acquired.load(Ordering::Relaxed),
        }
    }
}

/// A reserved slot on a [`ProviderGate`]; dropping it releases the slot
#[derive(Debug)]
pub struct GatePermit {
    counters: Arc<GateCounters>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        // Runs before the semaphore permit field is dropped, so the counter
        // never reports more holders than the semaphore admits.
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn gate(max: usize) -> Arc<ProviderGate> {
        Arc::new(ProviderGate::new(ProviderName::new("openai"), max).unwrap())
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = ProviderGate::new(ProviderName::new("openai"), 0).unwrap_err();
        assert_eq!(err, ConfigError::ZeroConcurrency("openai".to_string()));
    }

    #[tokio::test]
    async fn test_permit_release_on_drop() {
        let gate = gate(2);
        let first = gate.acquire().await.unwrap();
        let second = gate.acquire().await.unwrap();
        assert_eq!(gate.stats().in_flight, 2);

        drop(first);
        assert_eq!(gate.stats().in_flight, 1);
        drop(second);

        let stats = gate.stats();
        assert_eq!(stats.in_flight, 0);
        assert_eq!(stats.peak_in_flight, 2);
        assert_eq!(stats.total_acquired, 2);
    }

    #[tokio::test]
    async fn test_acquire_blocks_at_capacity() {
        let gate = gate(1);
        let held = gate.acquire().await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(20), gate.acquire()).await;
        assert!(blocked.is_err());

        drop(held);
        let permit = tokio::time::timeout(Duration::from_millis(20), gate.acquire()).await;
        assert!(permit.is_ok());
    }

    #[tokio::test]
    async fn test_peak_never_exceeds_limit() {
        let gate = gate(3);
        let mut handles = Vec::new();
        for _ in 0..20 {
            let gate = gate.clone();
            handles.push(tokio::spawn(async move {
                let _permit = gate.acquire().await.unwrap();
                tokio::time::sleep(Duration::from_millis(2)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = gate.stats();
        assert!(stats.peak_in_flight <= 3);
        assert_eq!(stats.total_acquired, 20);
        assert_eq!(stats.in_flight, 0);
    }

    #[tokio::test]
    async fn test_aborted_holder_releases_slot() {
        let gate = gate(1);
        let holder = {
            let gate = gate.clone();
            tokio::spawn(async move {
                let _permit = gate.acquire().await.unwrap();
                tokio::time::sleep(Duration::from_secs(3600)).await;
            })
        };

        // Let the holder take the slot, then abandon it
        tokio::task::yield_now().await;
        while gate.stats().in_flight == 0 {
            tokio::task::yield_now().await;
        }
        holder.abort();
        let _ = holder.await;

        let permit = tokio::time::timeout(Duration::from_millis(50), gate.acquire()).await;
        assert!(permit.is_ok());
    }
}
