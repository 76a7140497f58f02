//! Retry utilities.
//!
//! This module provides a bounded retry loop with exponential backoff and
//! randomized jitter. The loop stops early when the caller's cancellation token
//! fires, including while it is sleeping between attempts.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,

    /// Delay before the second attempt
    pub initial_delay: Duration,

    /// Maximum delay between attempts (before jitter)
    pub max_delay: Duration,

    /// Backoff multiplier (e.g., 2.0 for doubling)
    pub backoff_multiplier: f64,

    /// Upper bound of the random extra delay, as a fraction of the base delay
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            backoff_multiplier: 2.0,
            jitter: 0.25,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration.
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            ..Self::default()
        }
    }

    /// Set the maximum delay between retries.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Set the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Set the jitter fraction, clamped to `[0, 1]`.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Create a configuration that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: 0.0,
        }
    }
}

/// Exponential backoff state: attempts made so far and the delay before the next one.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    config: RetryConfig,
    current_attempt: u32,
}

impl ExponentialBackoff {
    /// Create a new exponential backoff calculator.
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            current_attempt: 0,
        }
    }

    /// Number of attempts started so far.
    pub fn attempts(&self) -> u32 {
        self.current_attempt
    }

    /// Delay before the next attempt, without jitter.
    ///
    /// Zero before the first attempt, then `initial_delay * multiplier^(n-1)`
    /// after the n-th attempt, capped at `max_delay`.
    pub fn delay(&self) -> Duration {
        if self.current_attempt == 0 {
            return Duration::ZERO;
        }

        let delay_ms = self.config.initial_delay.as_millis() as f64
            * self
                .config
                .backoff_multiplier
                .powi((self.current_attempt - 1) as i32);

        let delay = Duration::from_millis(delay_ms as u64);
        delay.min(self.config.max_delay)
    }

    /// Delay before the next attempt with a uniform random extra of up to `jitter * delay`.
    pub fn delay_with_jitter<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let base = self.delay();
        if self.config.jitter <= 0.0 || base.is_zero() {
            return base;
        }
        let extra = base.as_secs_f64() * self.config.jitter * rng.gen_range(0.0..=1.0);
        base + Duration::from_secs_f64(extra)
    }

    /// Move to the next attempt.
    pub fn next_attempt(&mut self) {
        self.current_attempt += 1;
    }

    /// Check if another attempt is allowed.
    pub fn has_attempts_remaining(&self) -> bool {
        self.current_attempt < self.config.max_attempts
    }
}

/// Why a retried operation gave up
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error
    #[error("retries exhausted after {attempts} attempts: {last_error}")]
    Exhausted {
        /// Attempts made
        attempts: u32,
        /// Error from the final attempt
        last_error: E,
    },

    /// An attempt failed with an error the predicate refused to retry
    #[error("non-retryable error on attempt {attempts}: {error}")]
    Permanent {
        /// Attempts made
        attempts: u32,
        /// The error
        error: E,
    },

    /// The cancellation token fired
    #[error("cancelled after {attempts} attempts")]
    Cancelled {
        /// Attempts started before cancellation
        attempts: u32,
    },
}

impl<E> RetryError<E> {
    /// Attempts made before giving up
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. }
            | RetryError::Permanent { attempts, .. }
            | RetryError::Cancelled { attempts } => *attempts,
        }
    }
}

/// Retry an async operation while `should_retry` accepts its error.
///
/// Makes at most `config.max_attempts` attempts. Between attempts it sleeps
/// for the jittered backoff delay. Cancellation is checked before each attempt,
/// raced against each attempt, and raced against each sleep.
///
/// # Examples
///
/// ```no_run
/// use answer_grader_common::retry::{retry_with_predicate, RetryConfig};
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() {
///     let cancel = CancellationToken::new();
///     let result = retry_with_predicate(
///         RetryConfig::default(),
///         &cancel,
///         || async { Err::<(), _>(std::io::Error::from(std::io::ErrorKind::TimedOut)) },
///         |err| err.kind() == std::io::ErrorKind::TimedOut,
///     )
///     .await;
///     assert!(result.is_err());
/// }
/// ```
pub async fn retry_with_predicate<F, Fut, T, E, P>(
    config: RetryConfig,
    cancel: &CancellationToken,
    operation: F,
    should_retry: P,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    retry_with_hint(config, cancel, operation, should_retry, |_| None).await
}

/// Like [`retry_with_predicate`], but `retry_after` may supply a server-requested
/// wait for an error.
///
/// The sleep before the next attempt is the larger of the jittered backoff and
/// the hint, so a rate limit's `Retry-After` is never undercut. The hint is not
/// capped by `max_delay`.
pub async fn retry_with_hint<F, Fut, T, E, P, H>(
    config: RetryConfig,
    cancel: &CancellationToken,
    mut operation: F,
    should_retry: P,
    retry_after: H,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    H: Fn(&E) -> Option<Duration>,
    E: std::fmt::Display,
{
    let mut backoff = ExponentialBackoff::new(config);

    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled {
                attempts: backoff.attempts(),
            });
        }

        backoff.next_attempt();
        let attempts = backoff.attempts();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RetryError::Cancelled { attempts }),
            result = operation() => result,
        };

        let error = match result {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if !should_retry(&error) {
            return Err(RetryError::Permanent { attempts, error });
        }

        if !backoff.has_attempts_remaining() {
            return Err(RetryError::Exhausted {
                attempts,
                last_error: error,
            });
        }

        let jittered = backoff.delay_with_jitter(&mut rand::thread_rng());
        let delay = retry_after(&error).map_or(jittered, |hint| hint.max(jittered));
        tracing::debug!(
            attempt = attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Retrying operation after retryable error"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RetryError::Cancelled { attempts }),
            _ = sleep(delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn io_error(kind: std::io::ErrorKind) -> std::io::Error {
        std::io::Error::new(kind, "error")
    }

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 4);
        assert_eq!(config.initial_delay, Duration::from_millis(500));
        assert_eq!(config.backoff_multiplier, 2.0);
    }

    #[test]
    fn test_retry_config_no_retry() {
        let config = RetryConfig::no_retry();
        assert_eq!(config.max_attempts, 1);
        let mut backoff = ExponentialBackoff::new(config);
        backoff.next_attempt();
        assert!(!backoff.has_attempts_remaining());
    }

    #[test]
    fn test_jitter_is_clamped() {
        assert_eq!(RetryConfig::default().with_jitter(3.0).jitter, 1.0);
        assert_eq!(RetryConfig::default().with_jitter(-1.0).jitter, 0.0);
    }

    #[test]
    fn test_exponential_backoff() {
        let config = RetryConfig::new(4, Duration::from_millis(100)).with_jitter(0.0);
        let mut backoff = ExponentialBackoff::new(config);

        // Nothing to wait for before the first attempt
        assert_eq!(backoff.delay(), Duration::ZERO);
        assert!(backoff.has_attempts_remaining());

        backoff.next_attempt();
        assert_eq!(backoff.delay(), Duration::from_millis(100));
        assert!(backoff.has_attempts_remaining());

        backoff.next_attempt();
        assert_eq!(backoff.delay(), Duration::from_millis(200));

        backoff.next_attempt();
        assert_eq!(backoff.delay(), Duration::from_millis(400));
        assert!(backoff.has_attempts_remaining());

        backoff.next_attempt();
        assert!(!backoff.has_attempts_remaining());
    }

    #[test]
    fn test_exponential_backoff_max_delay() {
        let config =
            RetryConfig::new(10, Duration::from_millis(100)).with_max_delay(Duration::from_millis(500));
        let mut backoff = ExponentialBackoff::new(config);

        for _ in 0..10 {
            backoff.next_attempt();
        }

        assert_eq!(backoff.delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let config = RetryConfig::new(5, Duration::from_millis(1000)).with_jitter(0.5);
        let mut backoff = ExponentialBackoff::new(config);
        backoff.next_attempt();

        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let delay = backoff.delay_with_jitter(&mut rng);
            assert!(delay >= Duration::from_millis(1000));
            assert!(delay <= Duration::from_millis(1500));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_first_time() {
        let cancel = CancellationToken::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_with_predicate(
            RetryConfig::default(),
            &cancel,
            || {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, std::io::Error>(42)
                }
            },
            |_| true,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_eventual_success() {
        let cancel = CancellationToken::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_with_predicate(
            RetryConfig::new(3, Duration::from_millis(100)),
            &cancel,
            || {
                let counter = counter_clone.clone();
                async move {
                    let count = counter.fetch_add(1, Ordering::SeqCst);
                    if count < 2 {
                        Err(io_error(std::io::ErrorKind::TimedOut))
                    } else {
                        Ok(42)
                    }
                }
            },
            |_| true,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_makes_exactly_max_attempts() {
        let cancel = CancellationToken::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_with_predicate(
            RetryConfig::new(3, Duration::from_millis(100)),
            &cancel,
            || {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(io_error(std::io::ErrorKind::TimedOut))
                }
            },
            |_| true,
        )
        .await;

        match result {
            Err(RetryError::Exhausted { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected exhaustion, got {:?}", other),
        }
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_with_predicate_stops_on_permanent_error() {
        let cancel = CancellationToken::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_with_predicate(
            RetryConfig::default(),
            &cancel,
            || {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(io_error(std::io::ErrorKind::ConnectionRefused))
                }
            },
            |err| err.kind() == std::io::ErrorKind::TimedOut,
        )
        .await;

        assert!(matches!(result, Err(RetryError::Permanent { attempts: 1, .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_backoff_sleep() {
        let cancel = CancellationToken::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let result = retry_with_predicate(
            RetryConfig::new(10, Duration::from_secs(60)).with_jitter(0.0),
            &cancel,
            || {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(io_error(std::io::ErrorKind::TimedOut))
                }
            },
            |_| true,
        )
        .await;

        assert!(matches!(result, Err(RetryError::Cancelled { attempts: 1 })));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_already_cancelled_makes_no_attempt() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = retry_with_predicate(
            RetryConfig::default(),
            &cancel,
            || async { Ok::<_, std::io::Error>(1) },
            |_| true,
        )
        .await;

        assert_eq!(result.unwrap_err().attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_hint_is_a_floor() {
        let cancel = CancellationToken::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();
        let start = tokio::time::Instant::now();

        let result = retry_with_hint(
            RetryConfig::new(3, Duration::from_millis(100)).with_jitter(0.0),
            &cancel,
            || {
                let counter = counter_clone.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(io_error(std::io::ErrorKind::WouldBlock))
                    } else {
                        Ok(7)
                    }
                }
            },
            |_| true,
            |err| (err.kind() == std::io::ErrorKind::WouldBlock).then(|| Duration::from_secs(30)),
        )
        .await;

        assert_eq!(result.unwrap(), 7);
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shorter_hint_keeps_backoff() {
        let cancel = CancellationToken::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();
        let start = tokio::time::Instant::now();

        let result = retry_with_hint(
            RetryConfig::new(2, Duration::from_secs(2)).with_jitter(0.0),
            &cancel,
            || {
                let counter = counter_clone.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(io_error(std::io::ErrorKind::TimedOut))
                    } else {
                        Ok(())
                    }
                }
            },
            |_| true,
            |_| Some(Duration::from_millis(10)),
        )
        .await;

        assert!(result.is_ok());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_secs(3));
    }
}
