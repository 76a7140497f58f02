//! HTTP scoring providers.
//!
//! Each provider turns a [`ScoringRequest`](answer_grader_domain::ScoringRequest)
//! into one API call and maps every HTTP or transport failure onto the
//! transient/permanent [`ProviderError`] taxonomy the engine retries on.

mod anthropic;
mod openai;

pub use anthropic::{AnthropicProvider, ANTHROPIC_API_VERSION, DEFAULT_ANTHROPIC_BASE_URL};
pub use openai::{OpenAiProvider, DEFAULT_OPENAI_BASE_URL};

use answer_grader_common::{GraderConfig, ProviderKind, ProviderSettings};
use answer_grader_domain::{ProviderError, ScoringProvider};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Longest response body excerpt kept in an error message
const MAX_ERROR_BODY_CHARS: usize = 300;

/// A provider ready to be registered with the engine
pub struct ConfiguredProvider {
    /// The provider client
    pub provider: Arc<dyn ScoringProvider>,
    /// Process-wide concurrency ceiling for this provider
    pub max_concurrency: usize,
}

/// Build every enabled provider whose API key is available in the environment.
pub fn build_providers(config: &GraderConfig) -> Result<Vec<ConfiguredProvider>> {
    build_providers_with(config, |var| std::env::var(var).ok())
}

/// Build providers, resolving API keys with `lookup`.
///
/// Providers whose key is missing or blank are skipped with a warning.
pub fn build_providers_with<F>(config: &GraderConfig, lookup: F) -> Result<Vec<ConfiguredProvider>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut providers = Vec::new();
    for settings in config.enabled_providers() {
        let Some(api_key) = lookup(&settings.api_key_env).filter(|key| !key.trim().is_empty()) else {
            warn!(
                provider = %settings.name,
                env = %settings.api_key_env,
                "API key not set, provider disabled"
            );
            continue;
        };

        let provider = build_provider(settings, api_key)
            .with_context(|| format!("Failed to build provider '{}'", settings.name))?;
        info!(
            provider = %settings.name,
            model = %settings.model,
            max_concurrency = settings.max_concurrency,
            "Provider registered"
        );
        providers.push(ConfiguredProvider {
            provider,
            max_concurrency: settings.max_concurrency,
        });
    }
    Ok(providers)
}

fn build_provider(settings: &ProviderSettings, api_key: String) -> Result<Arc<dyn ScoringProvider>> {
    let provider: Arc<dyn ScoringProvider> = match settings.kind {
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(
            settings.name.as_str(),
            settings.model.clone(),
            api_key,
            settings.base_url.as_deref(),
            settings.timeout(),
        )?),
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(
            settings.name.as_str(),
            settings.model.clone(),
            api_key,
            settings.base_url.as_deref(),
            settings.timeout(),
        )?),
    };
    Ok(provider)
}

/// Map a non-success HTTP status onto the provider error taxonomy
pub fn classify_status(status: StatusCode, retry_after: Option<Duration>, body: &str) -> ProviderError {
    let message = excerpt(body);
    match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { retry_after },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Unauthorized(message),
        StatusCode::REQUEST_TIMEOUT => ProviderError::Timeout,
        s if s.is_server_error() => ProviderError::Server {
            status: s.as_u16(),
            message,
        },
        s => ProviderError::BadRequest {
            status: s.as_u16(),
            message,
        },
    }
}

fn map_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_builder() {
        ProviderError::InvalidRequest(err.to_string())
    } else if err.is_timeout() {
        ProviderError::Timeout
    } else if err.is_decode() {
        ProviderError::InvalidResponse(err.to_string())
    } else {
        ProviderError::Connection(err.to_string())
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn excerpt(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }
    let mut truncated: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    truncated.push('…');
    truncated
}

/// Send a request and decode a successful JSON body
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request.send().await.map_err(map_transport_error)?;
    let status = response.status();

    if !status.is_success() {
        let retry_after = parse_retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "Provider returned an error status");
        return Err(classify_status(status, retry_after, &body));
    }

    let body = response.text().await.map_err(map_transport_error)?;
    serde_json::from_str(&body)
        .map_err(|e| ProviderError::InvalidResponse(format!("unexpected response body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use answer_grader_common::TelemetryConfig;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_classify_status() {
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, Some(Duration::from_secs(3)), ""),
            ProviderError::RateLimited {
                retry_after: Some(Duration::from_secs(3))
            }
        );
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, None, "upstream"),
            ProviderError::Server { status: 502, .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, None, "bad key"),
            ProviderError::Unauthorized(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, None, ""),
            ProviderError::Unauthorized(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::UNPROCESSABLE_ENTITY, None, "bad"),
            ProviderError::BadRequest { status: 422, .. }
        ));
    }

    #[test]
    fn test_transient_statuses_are_retryable() {
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, None, "").is_transient());
        assert!(classify_status(StatusCode::SERVICE_UNAVAILABLE, None, "").is_transient());
        assert!(!classify_status(StatusCode::BAD_REQUEST, None, "").is_transient());
        assert!(!classify_status(StatusCode::UNAUTHORIZED, None, "").is_transient());
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(7)));
        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "x".repeat(1_000);
        let message = excerpt(&body);
        assert_eq!(message.chars().count(), MAX_ERROR_BODY_CHARS + 1);
    }

    fn config_with_providers() -> GraderConfig {
        GraderConfig {
            engine: Default::default(),
            providers: vec![
                ProviderSettings {
                    name: "openai".into(),
                    kind: ProviderKind::OpenAi,
                    model: "gpt-4o-mini".into(),
                    base_url: None,
                    api_key_env: "TEST_OPENAI_KEY".into(),
                    max_concurrency: 4,
                    timeout_secs: 30,
                    enabled: true,
                },
                ProviderSettings {
                    name: "anthropic".into(),
                    kind: ProviderKind::Anthropic,
                    model: "claude-3-5-haiku-latest".into(),
                    base_url: None,
                    api_key_env: "TEST_ANTHROPIC_KEY".into(),
                    max_concurrency: 2,
                    timeout_secs: 30,
                    enabled: true,
                },
            ],
            telemetry: TelemetryConfig::default(),
        }
    }

    #[test]
    fn test_missing_key_skips_provider() {
        let config = config_with_providers();
        let providers = build_providers_with(&config, |var| {
            (var == "TEST_ANTHROPIC_KEY").then(|| "sk-test".to_string())
        })
        .unwrap();

        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].provider.name().as_str(), "anthropic");
        assert_eq!(providers[0].max_concurrency, 2);
    }

    #[test]
    fn test_disabled_provider_is_skipped() {
        let mut config = config_with_providers();
        config.providers[0].enabled = false;
        let providers = build_providers_with(&config, |_| Some("key".to_string())).unwrap();
        assert_eq!(providers.len(), 1);
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = config_with_providers();
        let providers = build_providers_with(&config, |_| Some("  ".to_string())).unwrap();
        assert!(providers.is_empty());
    }
}
