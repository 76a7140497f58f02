//! Evaluation Engine - the single entry point for grading an answer
//!
//! The engine owns one [`ProviderGate`] per registered provider for its whole
//! lifetime, so every concurrent evaluation shares the same per-provider
//! ceilings. Each call fans out through the [`Dispatcher`] and is reduced by
//! the [`Aggregator`], with the heuristic scorer as the terminal fallback.

use crate::scoring::aggregator::Aggregator;
use crate::scoring::config::EvaluationConfig;
use crate::scoring::dispatcher::Dispatcher;
use crate::scoring::gate::{GateStats, ProviderGate};
use crate::scoring::heuristic::HeuristicScorer;
use crate::scoring::request::{EvaluationMode, EvaluationRequest};
use crate::scoring::variant::VariantClient;
use crate::{ApplicationError, ApplicationResult};
use answer_grader_domain::{
    ConfigError, EvaluationId, EvaluationResult, ProviderName, ScoringProvider,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, Span};

/// Default cap on simultaneously running variant tasks per evaluation
pub const DEFAULT_MAX_IN_FLIGHT: usize = 16;

struct RegisteredProvider {
    provider: Arc<dyn ScoringProvider>,
    gate: Arc<ProviderGate>,
}

/// Grades question/answer pairs
pub struct EvaluationEngine {
    providers: Vec<RegisteredProvider>,
    config: EvaluationConfig,
    dispatcher: Dispatcher,
    aggregator: Aggregator,
}

impl EvaluationEngine {
    /// Start building an engine
    pub fn builder() -> EvaluationEngineBuilder {
        EvaluationEngineBuilder::new()
    }

    /// Default configuration used by [`evaluate`](Self::evaluate)
    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Names of the registered providers, in registration order
    pub fn provider_names(&self) -> Vec<&ProviderName> {
        self.providers.iter().map(|p| p.provider.name()).collect()
    }

    /// Accounting snapshot for one provider's gate
    pub fn gate_stats(&self, provider: &ProviderName) -> Option<GateStats> {
        self.providers
            .iter()
            .find(|p| p.provider.name() == provider)
            .map(|p| p.gate.stats())
    }

    /// Grade a pair with the engine's default configuration
    pub async fn evaluate(&self, request: &EvaluationRequest) -> ApplicationResult<EvaluationResult> {
        self.evaluate_with_config(request, &self.config).await
    }

    /// Grade a pair with an explicit configuration
    pub async fn evaluate_with_config(
        &self,
        request: &EvaluationRequest,
        config: &EvaluationConfig,
    ) -> ApplicationResult<EvaluationResult> {
        self.evaluate_with_cancel(request, config, &CancellationToken::new())
            .await
    }

    /// Grade a pair, stopping early when `cancel` fires.
    ///
    /// Configuration errors are reported before any provider is called. Once
    /// dispatch starts, only cancellation can make this fail; provider and
    /// parse failures end up in the result.
    #[instrument(
        skip(self, request, config, cancel),
        fields(question_id = %request.question_id, evaluation_id = tracing::field::Empty)
    )]
    pub async fn evaluate_with_cancel(
        &self,
        request: &EvaluationRequest,
        config: &EvaluationConfig,
        cancel: &CancellationToken,
    ) -> ApplicationResult<EvaluationResult> {
        config.validate()?;
        let selected = self.select_providers(config)?;

        let evaluation_id = EvaluationId::new();
        Span::current().record("evaluation_id", tracing::field::display(&evaluation_id));

        let heuristic_only = request.mode == EvaluationMode::HeuristicOnly || config.heuristic_only;
        if heuristic_only || selected.is_empty() {
            debug!(heuristic_only, "Scoring without providers");
            return Ok(self
                .aggregator
                .aggregate(evaluation_id, request, Vec::new(), &config.weights));
        }

        if cancel.is_cancelled() {
            return Err(ApplicationError::Cancelled);
        }

        let clients: Vec<Arc<VariantClient>> = selected
            .iter()
            .map(|registered| {
                Arc::new(VariantClient::new(
                    registered.provider.clone(),
                    registered.gate.clone(),
                    config.retry.clone(),
                    config.temperature,
                ))
            })
            .collect();

        info!(
            providers = clients.len(),
            variants_per_provider = config.variants_per_provider,
            "Starting evaluation"
        );

        let outcomes = self
            .dispatcher
            .dispatch(request, config.variants_per_provider, &clients, cancel)
            .await;

        if cancel.is_cancelled() {
            info!("Evaluation cancelled");
            return Err(ApplicationError::Cancelled);
        }

        let result = self
            .aggregator
            .aggregate(evaluation_id, request, outcomes, &config.weights);
        info!(
            final_score = result.final_score,
            success_count = result.success_count,
            attempted_count = result.attempted_count,
            heuristic_fallback = result.heuristic_fallback,
            "Evaluation complete"
        );
        Ok(result)
    }

    fn select_providers(&self, config: &EvaluationConfig) -> ApplicationResult<Vec<&RegisteredProvider>> {
        let Some(enabled) = &config.enabled_providers else {
            return Ok(self.providers.iter().collect());
        };

        let mut selected = Vec::with_capacity(enabled.len());
        for name in enabled {
            let registered = self
                .providers
                .iter()
                .find(|p| p.provider.name() == name)
                .ok_or_else(|| ConfigError::UnknownProvider(name.to_string()))?;
            if !selected
                .iter()
                .any(|p: &&RegisteredProvider| p.provider.name() == name)
            {
                selected.push(registered);
            }
        }
        Ok(selected)
    }
}

/// Builder for [`EvaluationEngine`]
pub struct EvaluationEngineBuilder {
    providers: Vec<(Arc<dyn ScoringProvider>, usize)>,
    config: EvaluationConfig,
    max_in_flight: usize,
    heuristic: HeuristicScorer,
}

impl EvaluationEngineBuilder {
    /// Create a builder with no providers and the default configuration
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            config: EvaluationConfig::default(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            heuristic: HeuristicScorer::default(),
        }
    }

    /// Register a provider allowing `max_concurrency` simultaneous calls
    pub fn provider(mut self, provider: Arc<dyn ScoringProvider>, max_concurrency: usize) -> Self {
        self.providers.push((provider, max_concurrency));
        self
    }

    /// Default evaluation configuration
    pub fn config(mut self, config: EvaluationConfig) -> Self {
        self.config = config;
        self
    }

    /// Requested task cap per evaluation (clamped by the dispatcher)
    pub fn max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    /// Fallback scorer
    pub fn heuristic(mut self, heuristic: HeuristicScorer) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Build the engine, creating one gate per provider
    pub fn build(self) -> ApplicationResult<EvaluationEngine> {
        self.config.validate()?;

        let mut seen = HashSet::new();
        let mut providers = Vec::with_capacity(self.providers.len());
        for (provider, max_concurrency) in self.providers {
            let name = provider.name().clone();
            if !seen.insert(name.clone()) {
                return Err(ConfigError::DuplicateProvider(name.to_string()).into());
            }
            let gate = Arc::new(ProviderGate::new(name, max_concurrency)?);
            providers.push(RegisteredProvider { provider, gate });
        }

        Ok(EvaluationEngine {
            providers,
            config: self.config,
            dispatcher: Dispatcher::new(self.max_in_flight),
            aggregator: Aggregator::new(self.heuristic),
        })
    }
}

impl Default for EvaluationEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use answer_grader_testing::{fixtures, ScriptedProvider};

    fn sample_request() -> EvaluationRequest {
        EvaluationRequest::new(
            "q1",
            fixtures::QUESTION,
            fixtures::EXPECTED_ANSWER,
            fixtures::CANDIDATE_ANSWER,
        )
    }

    fn scripted(name: &str) -> Arc<dyn ScoringProvider> {
        Arc::new(ScriptedProvider::new(name).always_ok(fixtures::score_json(4.0, 4.0, 4.0)))
    }

    #[test]
    fn test_builder_rejects_duplicate_provider() {
        let err = EvaluationEngine::builder()
            .provider(scripted("openai"), 2)
            .provider(scripted("OpenAI"), 2)
            .build()
            .err()
            .unwrap();
        assert_eq!(err.error_code(), "DUPLICATE_PROVIDER");
    }

    #[test]
    fn test_builder_rejects_zero_concurrency() {
        let err = EvaluationEngine::builder()
            .provider(scripted("openai"), 0)
            .build()
            .err()
            .unwrap();
        assert_eq!(err.error_code(), "ZERO_CONCURRENCY");
    }

    #[tokio::test]
    async fn test_unknown_provider_fails_before_dispatch() {
        let engine = EvaluationEngine::builder()
            .provider(scripted("openai"), 2)
            .build()
            .unwrap();
        let config = EvaluationConfig::default().with_providers(["anthropic"]);

        let err = engine
            .evaluate_with_config(&sample_request(), &config)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_PROVIDER");
        assert_eq!(
            engine.gate_stats(&"openai".into()).unwrap().total_acquired,
            0
        );
    }

    #[tokio::test]
    async fn test_selected_providers_only() {
        let engine = EvaluationEngine::builder()
            .provider(scripted("openai"), 2)
            .provider(scripted("anthropic"), 2)
            .build()
            .unwrap();
        let config = EvaluationConfig::default()
            .with_providers(["anthropic"])
            .with_variants_per_provider(2);

        let result = engine
            .evaluate_with_config(&sample_request(), &config)
            .await
            .unwrap();
        assert_eq!(result.attempted_count, 2);
        assert_eq!(
            engine.gate_stats(&"openai".into()).unwrap().total_acquired,
            0
        );
        assert_eq!(
            engine.gate_stats(&"anthropic".into()).unwrap().total_acquired,
            2
        );
    }

    #[tokio::test]
    async fn test_no_providers_uses_heuristic() {
        let engine = EvaluationEngine::builder().build().unwrap();
        let result = engine.evaluate(&sample_request()).await.unwrap();
        assert!(result.heuristic_fallback);
        assert_eq!(result.attempted_count, 0);
    }
}
