//! Mock implementations of external scoring providers.
//!
//! Provides in-memory providers for testing the engine without network access.

use answer_grader_domain::{ProviderError, ProviderName, ScoringProvider, ScoringRequest};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

type Scripted = Result<String, ProviderError>;

/// Provider that replays a fixed script of responses.
///
/// Queued responses are returned in order; once the queue is empty every call
/// gets the fallback response, or `InvalidResponse` when none is set.
pub struct ScriptedProvider {
    name: ProviderName,
    script: Mutex<VecDeque<Scripted>>,
    fallback: Option<Scripted>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    requests: Mutex<Vec<ScoringRequest>>,
}

impl ScriptedProvider {
    pub fn new(name: impl Into<ProviderName>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful raw response
    pub fn then_ok(self, raw: impl Into<String>) -> Self {
        self.script.lock().push_back(Ok(raw.into()));
        self
    }

    /// Queue an error
    pub fn then_err(self, error: ProviderError) -> Self {
        self.script.lock().push_back(Err(error));
        self
    }

    /// Answer every call past the queue with `raw`
    pub fn always_ok(mut self, raw: impl Into<String>) -> Self {
        self.fallback = Some(Ok(raw.into()));
        self
    }

    /// Fail every call past the queue with `error`
    pub fn always_err(mut self, error: ProviderError) -> Self {
        self.fallback = Some(Err(error));
        self
    }

    /// Sleep for `delay` inside every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Calls started so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed running at once
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Requests received, in arrival order
    pub fn requests(&self) -> Vec<ScoringRequest> {
        self.requests.lock().clone()
    }

    fn next_response(&self) -> Scripted {
        if let Some(next) = self.script.lock().pop_front() {
            return next;
        }
        self.fallback.clone().unwrap_or_else(|| {
            Err(ProviderError::InvalidResponse(
                "scripted provider has no response left".to_string(),
            ))
        })
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ScoringProvider for ScriptedProvider {
    fn name(&self) -> &ProviderName {
        &self.name
    }

    async fn score(&self, request: &ScoringRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.next_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_then_fallback() {
        let provider = ScriptedProvider::new("openai")
            .then_err(ProviderError::Timeout)
            .always_ok("{}");
        let request = ScoringRequest::new("p", 1);

        assert_eq!(provider.score(&request).await, Err(ProviderError::Timeout));
        assert_eq!(provider.score(&request).await, Ok("{}".to_string()));
        assert_eq!(provider.score(&request).await, Ok("{}".to_string()));
        assert_eq!(provider.calls(), 3);
        assert_eq!(provider.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_script_is_invalid_response() {
        let provider = ScriptedProvider::new("openai");
        let result = provider.score(&ScoringRequest::new("p", 1)).await;
        assert!(matches!(result, Err(ProviderError::InvalidResponse(_))));
    }
}
