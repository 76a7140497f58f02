//! Anthropic messages API.

use super::send_json;
use answer_grader_domain::{ProviderError, ProviderName, ScoringProvider, ScoringRequest};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

/// Public Anthropic API root
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Value sent in the `anthropic-version` header
pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Scores through `POST {base_url}/v1/messages`
pub struct AnthropicProvider {
    name: ProviderName,
    model: String,
    endpoint: String,
    http: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a client; `base_url` defaults to [`DEFAULT_ANTHROPIC_BASE_URL`]
    pub fn new(
        name: impl Into<ProviderName>,
        model: impl Into<String>,
        api_key: String,
        base_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_API_VERSION),
        );
        let mut key =
            HeaderValue::from_str(&api_key).context("API key is not a valid header value")?;
        key.set_sensitive(true);
        headers.insert("x-api-key", key);

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = base_url
            .unwrap_or(DEFAULT_ANTHROPIC_BASE_URL)
            .trim_end_matches('/');
        Ok(Self {
            name: name.into(),
            model: model.into(),
            endpoint: format!("{}/v1/messages", base_url),
            http,
        })
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: [UserMessage<'a>; 1],
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl ScoringProvider for AnthropicProvider {
    fn name(&self) -> &ProviderName {
        &self.name
    }

    // The messages API takes no seed; temperature 0 is the reproducibility lever
    #[instrument(skip(self, request), fields(provider = %self.name, model = %self.model))]
    async fn score(&self, request: &ScoringRequest) -> Result<String, ProviderError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature.min(1.0),
            messages: [UserMessage {
                role: "user",
                content: &request.prompt,
            }],
        };

        let response: MessagesResponse =
            send_json(self.http.post(&self.endpoint).json(&body)).await?;
        let text: String = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();

        if text.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "message has no text content".into(),
            ));
        }
        Ok(text)
    }
}
