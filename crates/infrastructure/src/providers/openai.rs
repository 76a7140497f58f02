//! OpenAI-compatible chat completions.

use super::send_json;
use answer_grader_domain::{ProviderError, ProviderName, ScoringProvider, ScoringRequest};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

/// Public OpenAI API root
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

const SYSTEM_PROMPT: &str = "You are a strict grader. Reply with JSON only.";

/// Scores through `POST {base_url}/chat/completions`
pub struct OpenAiProvider {
    name: ProviderName,
    model: String,
    endpoint: String,
    http: reqwest::Client,
}

impl OpenAiProvider {
    /// Create a client; `base_url` defaults to [`DEFAULT_OPENAI_BASE_URL`]
    pub fn new(
        name: impl Into<ProviderName>,
        model: impl Into<String>,
        api_key: String,
        base_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .context("API key is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = base_url.unwrap_or(DEFAULT_OPENAI_BASE_URL).trim_end_matches('/');
        Ok(Self {
            name: name.into(),
            model: model.into(),
            endpoint: format!("{}/chat/completions", base_url),
            http,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    seed: u64,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[async_trait]
impl ScoringProvider for OpenAiProvider {
    fn name(&self) -> &ProviderName {
        &self.name
    }

    #[instrument(skip(self, request), fields(provider = %self.name, model = %self.model))]
    async fn score(&self, request: &ScoringRequest) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            seed: request.seed,
            max_tokens: request.max_tokens,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response: ChatResponse = send_json(self.http.post(&self.endpoint).json(&body)).await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse("completion has no message content".into()))
    }
}
