//! Resolved per-evaluation configuration.

use answer_grader_common::{EngineSettings, RetryConfig};
use answer_grader_domain::{ConfigError, ConfigResult, ProviderName, RawWeights, Weights};

/// Fully resolved evaluation settings.
///
/// Weights are normalized here, once; the engine never re-derives them.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationConfig {
    /// Providers to use; `None` means every provider registered with the engine
    pub enabled_providers: Option<Vec<ProviderName>>,
    /// Prompt variants per provider
    pub variants_per_provider: u32,
    /// Retry policy for transient provider errors
    pub retry: RetryConfig,
    /// Normalized criterion weights
    pub weights: Weights,
    /// Sampling temperature for provider calls
    pub temperature: f64,
    /// Skip providers entirely
    pub heuristic_only: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            enabled_providers: None,
            variants_per_provider: 3,
            retry: RetryConfig::default(),
            weights: Weights::default(),
            temperature: 0.0,
            heuristic_only: false,
        }
    }
}

impl EvaluationConfig {
    /// Resolve engine settings, normalizing weights and checking limits
    pub fn from_settings(settings: &EngineSettings) -> ConfigResult<Self> {
        let config = Self {
            enabled_providers: None,
            variants_per_provider: settings.variants_per_provider,
            retry: settings.retry.to_retry_config(),
            weights: Weights::normalize(settings.weights)?,
            temperature: settings.temperature,
            heuristic_only: settings.heuristic_only,
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace the weights, normalizing them
    pub fn with_weights(mut self, raw: RawWeights) -> ConfigResult<Self> {
        self.weights = Weights::normalize(raw)?;
        Ok(self)
    }

    /// Set the number of variants per provider
    pub fn with_variants_per_provider(mut self, variants: u32) -> Self {
        self.variants_per_provider = variants;
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Restrict the evaluation to the named providers
    pub fn with_providers<I, N>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<ProviderName>,
    {
        self.enabled_providers = Some(providers.into_iter().map(Into::into).collect());
        self
    }

    /// Force heuristic-only scoring
    pub fn with_heuristic_only(mut self, heuristic_only: bool) -> Self {
        self.heuristic_only = heuristic_only;
        self
    }

    /// Check limits that would make an evaluation meaningless
    pub fn validate(&self) -> ConfigResult<()> {
        if self.variants_per_provider == 0 {
            return Err(ConfigError::NoVariants);
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::NoAttempts);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature must be within [0, 2], got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use answer_grader_domain::Criterion;
    use std::time::Duration;

    #[test]
    fn test_from_settings_normalizes_weights() {
        let mut settings = EngineSettings::default();
        settings.weights = RawWeights::new(0.6, 0.4, 1.0);

        let config = EvaluationConfig::from_settings(&settings).unwrap();
        assert!((config.weights.get(Criterion::Correctness) - 0.5).abs() < 1e-12);
        assert_eq!(config.retry.max_attempts, settings.retry.max_attempts);
        assert_eq!(
            config.retry.initial_delay,
            Duration::from_millis(settings.retry.base_delay_ms)
        );
    }

    #[test]
    fn test_zero_weights_rejected_eagerly() {
        let mut settings = EngineSettings::default();
        settings.weights = RawWeights::new(0.0, 0.0, 0.0);
        assert_eq!(
            EvaluationConfig::from_settings(&settings).unwrap_err(),
            ConfigError::ZeroWeightSum
        );
    }

    #[test]
    fn test_zero_variants_rejected() {
        let config = EvaluationConfig::default().with_variants_per_provider(0);
        assert_eq!(config.validate().unwrap_err(), ConfigError::NoVariants);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut retry = RetryConfig::default();
        retry.max_attempts = 0;
        let config = EvaluationConfig::default().with_retry(retry);
        assert_eq!(config.validate().unwrap_err(), ConfigError::NoAttempts);
    }

    #[test]
    fn test_with_providers_normalizes_names() {
        let config = EvaluationConfig::default().with_providers(["OpenAI", " anthropic "]);
        assert_eq!(
            config.enabled_providers.unwrap(),
            vec![ProviderName::new("openai"), ProviderName::new("anthropic")]
        );
    }
}
