//! OpenAI-Compatible Completion Client
//!
//! Talks to any endpoint that speaks the OpenAI chat completions protocol.
//! The request is shaped for short chat lines: system prompt first, the
//! recent history rendered with speaker prefixes, then a trailing reminder
//! to stay on topic.

use super::error::{ProviderError, Result};
use super::r#trait::CompletionService;
use super::types::*;
use crate::config::{LlmConfig, SecretString};
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

const COHERENCE_REMINDER: &str =
    "Remember to stay on topic and maintain conversation coherence with previous messages.";

/// Returned when the upstream choice carries no text.
pub const EMPTY_COMPLETION_TEXT: &str = "I'm not sure what to say.";

/// Last-resort filler line.
pub const FILLER_FALLBACK_TEXT: &str = "Interesting point.";

const FILLER_PROMPTS: &[&str] = &[
    "Generate a very short (5-7 words) casual response that could fit in any conversation.",
    "Create a brief, natural-sounding reply that could work in most conversations.",
    "Write a short, generic response that sounds human and conversational.",
    "Generate a brief, thoughtful comment that could fit in most discussions.",
];

const FILLER_MAX_TOKENS: u32 = 20;

/// OpenAI chat completions client
#[derive(Clone)]
pub struct OpenAiCompletion {
    api_key: Option<SecretString>,
    base_url: String,
    client: Client,
    model: String,
    temperature: f32,
    max_tokens: u32,
    presence_penalty: f32,
    frequency_penalty: f32,
    history_limit: usize,
}

impl OpenAiCompletion {
    /// Create a client from the `[llm]` configuration section.
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(DEFAULT_POOL_IDLE_TIMEOUT)
            .pool_max_idle_per_host(2)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            client,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            presence_penalty: config.presence_penalty,
            frequency_penalty: config.frequency_penalty,
            history_limit: config.history_limit,
        }
    }

    /// Whether an API key is available.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Build request headers
    fn headers(&self) -> std::result::Result<reqwest::header::HeaderMap, ProviderError> {
        let mut headers = reqwest::header::HeaderMap::new();

        let key = self
            .api_key
            .as_ref()
            .filter(|k| !k.is_empty())
            .ok_or(ProviderError::MissingApiKey)?;
        let clean_key = key.expose_secret().trim();
        let header_value: reqwest::header::HeaderValue = format!("Bearer {}", clean_key)
            .parse()
            .map_err(|_| {
                tracing::error!("API key contains invalid characters (length={})", clean_key.len());
                ProviderError::InvalidApiKey
            })?;
        headers.insert(reqwest::header::AUTHORIZATION, header_value);
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    /// Shape a completion request into OpenAI messages.
    fn to_openai_request(&self, request: &CompletionRequest) -> OpenAiRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 2);
        messages.push(OpenAiMessage {
            role: Role::System.as_str().to_string(),
            content: Some(request.prompt.clone()),
        });

        let skip = request.messages.len().saturating_sub(self.history_limit);
        for msg in request.messages.iter().skip(skip) {
            messages.push(OpenAiMessage {
                role: msg.role.as_str().to_string(),
                content: Some(msg.rendered()),
            });
        }

        messages.push(OpenAiMessage {
            role: Role::System.as_str().to_string(),
            content: Some(COHERENCE_REMINDER.to_string()),
        });

        OpenAiRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(self.temperature),
            max_tokens: Some(request.max_tokens.unwrap_or(self.max_tokens)),
            presence_penalty: Some(self.presence_penalty),
            frequency_penalty: Some(self.frequency_penalty),
        }
    }

    /// Handle API error response
    async fn handle_error(&self, response: reqwest::Response) -> ProviderError {
        let status = response.status().as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok().and_then(|s| s.parse::<u64>().ok()));

        if let Ok(error_body) = response.json::<OpenAiErrorResponse>().await {
            if status == 429 {
                let message = match retry_after {
                    Some(secs) => format!("{} (retry after {} seconds)", error_body.error.message, secs),
                    None => error_body.error.message,
                };
                return ProviderError::RateLimitExceeded(message);
            }
            return ProviderError::ApiError {
                status,
                message: error_body.error.message,
                error_type: error_body.error.error_type,
            };
        }

        if status == 429 {
            ProviderError::RateLimitExceeded("Rate limit exceeded, please retry later".to_string())
        } else {
            ProviderError::ApiError {
                status,
                message: "Unknown error".to_string(),
                error_type: None,
            }
        }
    }

    async fn send(&self, body: &OpenAiRequest) -> Result<OpenAiResponse> {
        tracing::debug!("Sending completion request to {}", self.base_url);
        let response = self
            .client
            .post(&self.base_url)
            .headers(self.headers()?)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Completion API response status: {}", status);
        if !status.is_success() {
            return Err(self.handle_error(response).await);
        }

        Ok(response.json::<OpenAiResponse>().await?)
    }

    /// Generate a short generic filler line.
    ///
    /// Used when the main completion fails; never errors, falling back to
    /// [`FILLER_FALLBACK_TEXT`].
    pub async fn generate_filler(&self) -> String {
        let prompt = FILLER_PROMPTS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(FILLER_PROMPTS[0]);

        let body = OpenAiRequest {
            model: self.model.clone(),
            messages: vec![OpenAiMessage {
                role: Role::System.as_str().to_string(),
                content: Some(prompt.to_string()),
            }],
            temperature: Some(self.temperature),
            max_tokens: Some(FILLER_MAX_TOKENS),
            presence_penalty: None,
            frequency_penalty: None,
        };

        match self.send(&body).await {
            Ok(resp) => resp
                .first_text()
                .unwrap_or_else(|| FILLER_FALLBACK_TEXT.to_string()),
            Err(e) => {
                tracing::warn!("Filler generation failed: {}", e);
                FILLER_FALLBACK_TEXT.to_string()
            }
        }
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let started = Instant::now();
        let message_count = request.messages.len();
        let body = self.to_openai_request(&request);

        tracing::info!(
            "Completion request: model={}, messages={}, max_tokens={}",
            body.model,
            message_count,
            body.max_tokens.unwrap_or(self.max_tokens)
        );

        let response = match self.send(&body).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("Completion request failed: {}", e);
                return Err(e);
            }
        };

        let model = response.model.clone().unwrap_or_else(|| self.model.clone());
        let text = response
            .first_text()
            .unwrap_or_else(|| EMPTY_COMPLETION_TEXT.to_string());
        let elapsed = started.elapsed().as_millis() as u64;
        tracing::info!("Completion generated in {}ms", elapsed);

        Ok(CompletionResponse {
            response: text,
            metadata: CompletionMetadata {
                processing_time_ms: elapsed,
                message_count,
                model,
                fallback: false,
            },
        })
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        self.has_api_key()
    }

    async fn filler(&self) -> String {
        self.generate_filler().await
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

impl OpenAiResponse {
    fn first_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base_url: String) -> LlmConfig {
        LlmConfig {
            base_url,
            api_key: Some(SecretString::from_str("sk-test")),
            ..Default::default()
        }
    }

    #[test]
    fn test_request_shape() {
        let client = OpenAiCompletion::from_config(&LlmConfig {
            history_limit: 2,
            ..test_config("http://localhost".into())
        });
        let request = CompletionRequest::new("be brief").with_messages(vec![
            ChatMessage::user("one").with_sender("Player 1"),
            ChatMessage::assistant("two").with_sender("Player 2"),
            ChatMessage::assistant("three").with_sender("Player 3"),
        ]);

        let body = client.to_openai_request(&request);
        assert_eq!(body.messages.len(), 4);
        assert_eq!(body.messages[0].role, "system");
        assert_eq!(body.messages[0].content.as_deref(), Some("be brief"));
        assert_eq!(body.messages[1].content.as_deref(), Some("Player 2: two"));
        assert_eq!(body.messages[2].content.as_deref(), Some("Player 3: three"));
        assert_eq!(body.messages[3].content.as_deref(), Some(COHERENCE_REMINDER));
        assert_eq!(body.max_tokens, Some(60));
    }

    #[test]
    fn test_missing_key_rejected() {
        let client = OpenAiCompletion::from_config(&LlmConfig::default());
        assert!(!client.has_api_key());
        assert!(matches!(client.headers(), Err(ProviderError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_complete_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"model":"gpt-3.5-turbo-0125","choices":[{"message":{"role":"assistant","content":"sounds fun honestly"}}]}"#,
            )
            .create_async()
            .await;

        let client = OpenAiCompletion::from_config(&test_config(format!(
            "{}/v1/chat/completions",
            server.url()
        )));
        let resp = client
            .complete(CompletionRequest::new("say something"))
            .await
            .expect("completion");

        assert_eq!(resp.response, "sounds fun honestly");
        assert_eq!(resp.metadata.model, "gpt-3.5-turbo-0125");
        assert!(!resp.metadata.fallback);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#)
            .create_async()
            .await;

        let client = OpenAiCompletion::from_config(&test_config(format!(
            "{}/v1/chat/completions",
            server.url()
        )));
        let err = client
            .complete(CompletionRequest::new("say something"))
            .await
            .expect_err("should fail");

        match err {
            ProviderError::ApiError { status, message, .. } => {
                assert_eq!(status, 401);
                assert!(message.contains("Incorrect API key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_choice_uses_default_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let client = OpenAiCompletion::from_config(&test_config(format!(
            "{}/v1/chat/completions",
            server.url()
        )));
        let resp = client
            .complete(CompletionRequest::new("x"))
            .await
            .expect("completion");
        assert_eq!(resp.response, EMPTY_COMPLETION_TEXT);
    }

    #[tokio::test]
    async fn test_filler_falls_back_to_literal() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .create_async()
            .await;

        let client = OpenAiCompletion::from_config(&test_config(format!(
            "{}/v1/chat/completions",
            server.url()
        )));
        assert_eq!(client.generate_filler().await, FILLER_FALLBACK_TEXT);
    }
}
