//! Configuration management for the grader.
//!
//! Settings are layered from configuration files and environment variables.
//! The engine itself only consumes resolved values; this module is where raw
//! values are read and sanity-checked.
//!
//! ## Example Configuration
//!
//! ```toml
//! [engine]
//! variants_per_provider = 3
//! max_in_flight = 16
//!
//! [engine.retry]
//! max_attempts = 4
//! base_delay_ms = 500
//!
//! [engine.weights]
//! completeness = 0.6
//! conciseness = 0.4
//! correctness = 1.0
//!
//! [[providers]]
//! name = "openai"
//! kind = "openai"
//! model = "gpt-4o-mini"
//! api_key_env = "OPENAI_API_KEY"
//! max_concurrency = 4
//! ```

use crate::retry::RetryConfig;
use answer_grader_domain::RawWeights;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main grader configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraderConfig {
    /// Evaluation engine settings
    #[serde(default)]
    pub engine: EngineSettings,
    /// External scoring providers
    #[serde(default)]
    pub providers: Vec<ProviderSettings>,
    /// Logging settings
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Evaluation engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Prompt variants sent to each provider per answer
    #[serde(default = "default_variants_per_provider")]
    pub variants_per_provider: u32,

    /// Requested cap on simultaneously running variant tasks per evaluation
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Requested cap on answers graded concurrently in one submission
    #[serde(default = "default_max_concurrent_answers")]
    pub max_concurrent_answers: usize,

    /// Sampling temperature for scoring calls
    #[serde(default)]
    pub temperature: f64,

    /// Skip providers and always use the heuristic scorer
    #[serde(default)]
    pub heuristic_only: bool,

    /// Retry policy for transient provider errors
    #[serde(default)]
    pub retry: RetrySettings,

    /// Raw criterion weights (normalized at resolution)
    #[serde(default)]
    pub weights: RawWeights,
}

/// Retry policy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per variant, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound on the un-jittered delay
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Random extra delay as a fraction of the base delay
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

/// Supported provider APIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions
    OpenAi,
    /// Anthropic messages API
    Anthropic,
}

/// One external scoring provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Provider name used for gating and provenance
    pub name: String,

    /// API flavour
    pub kind: ProviderKind,

    /// Model identifier
    pub model: String,

    /// Override for the API base URL
    #[serde(default)]
    pub base_url: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Maximum concurrent calls to this provider across the process
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Whether the provider takes part in evaluations
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Enable JSON logging format
    #[serde(default)]
    pub json_logging: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions
fn default_variants_per_provider() -> u32 {
    3
}

fn default_max_in_flight() -> usize {
    16
}

fn default_max_concurrent_answers() -> usize {
    8
}

fn default_max_attempts() -> u32 {
    4
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8_000
}

fn default_jitter() -> f64 {
    0.25
}

fn default_max_concurrency() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_enabled() -> bool {
    true
}

fn default_service_name() -> String {
    "answer-grader".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            variants_per_provider: default_variants_per_provider(),
            max_in_flight: default_max_in_flight(),
            max_concurrent_answers: default_max_concurrent_answers(),
            temperature: 0.0,
            heuristic_only: false,
            retry: RetrySettings::default(),
            weights: RawWeights::default(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: default_jitter(),
        }
    }
}

impl RetrySettings {
    /// Convert to the retry loop's configuration
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
            .with_jitter(self.jitter)
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            json_logging: false,
            log_level: default_log_level(),
        }
    }
}

impl ProviderSettings {
    /// Per-request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl GraderConfig {
    /// Load configuration from files and environment variables.
    ///
    /// The configuration is loaded in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/{environment}.toml (if exists, where environment is from GRADER_ENV)
    /// 4. Environment variables (prefixed with GRADER_)
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use answer_grader_common::config::GraderConfig;
    ///
    /// let config = GraderConfig::load().expect("Failed to load configuration");
    /// println!("{} variants per provider", config.engine.variants_per_provider);
    /// ```
    pub fn load() -> Result<Self> {
        let env = std::env::var("GRADER_ENV").unwrap_or_else(|_| "development".to_string());

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false));

        Self::build(builder)
    }

    /// Load configuration from an explicit file, still honouring environment overrides.
    pub fn load_from(path: &str) -> Result<Self> {
        let builder = config::Config::builder().add_source(config::File::with_name(path));
        Self::build(builder)
    }

    fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let config = builder
            // Example: GRADER_ENGINE__VARIANTS_PER_PROVIDER=5
            .add_source(
                config::Environment::with_prefix("GRADER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let grader_config: GraderConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        grader_config.validate()?;

        Ok(grader_config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.engine.variants_per_provider == 0 {
            anyhow::bail!("variants_per_provider must be greater than 0");
        }

        if self.engine.max_in_flight == 0 {
            anyhow::bail!("max_in_flight must be greater than 0");
        }

        if self.engine.max_concurrent_answers == 0 {
            anyhow::bail!("max_concurrent_answers must be greater than 0");
        }

        if self.engine.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be greater than 0");
        }

        if !(0.0..=2.0).contains(&self.engine.temperature) {
            anyhow::bail!(
                "temperature must be between 0 and 2, got {}",
                self.engine.temperature
            );
        }

        let mut seen = std::collections::HashSet::new();
        for provider in &self.providers {
            if provider.name.trim().is_empty() {
                anyhow::bail!("Provider name is required");
            }
            if !seen.insert(provider.name.trim().to_ascii_lowercase()) {
                anyhow::bail!("Provider '{}' is configured more than once", provider.name);
            }
            if provider.model.is_empty() {
                anyhow::bail!("Provider '{}' has no model", provider.name);
            }
            if provider.max_concurrency == 0 {
                anyhow::bail!(
                    "Provider '{}' max_concurrency must be greater than 0",
                    provider.name
                );
            }
            if provider.timeout_secs == 0 {
                anyhow::bail!("Provider '{}' timeout must be greater than 0", provider.name);
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.telemetry.log_level.as_str()) {
            anyhow::bail!(
                "Invalid log level '{}'. Must be one of: {}",
                self.telemetry.log_level,
                valid_log_levels.join(", ")
            );
        }

        Ok(())
    }

    /// Providers that take part in evaluations
    pub fn enabled_providers(&self) -> impl Iterator<Item = &ProviderSettings> {
        self.providers.iter().filter(|p| p.enabled)
    }
}
