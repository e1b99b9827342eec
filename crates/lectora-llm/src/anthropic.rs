//! Anthropic Provider Implementation
//!
//! Calls the Anthropic Messages API. The system instruction travels in the
//! dedicated `system` field and sampling is pinned to temperature 0 so that
//! re-running an analysis gives comparable output.
//!
//! # Examples
//!
//! ```no_run
//! use lectora_llm::AnthropicProvider;
//!
//! let provider = AnthropicProvider::new("sk-ant-...", "claude-3-haiku-20240307").unwrap();
//! ```

use crate::{error_for_status, Completion, GenerationRequest, LlmError, LlmProvider};
use async_trait::async_trait;
use lectora_domain::TokenUsage;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default Anthropic API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";

/// API version header value
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default model
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

/// Anthropic Messages API provider
pub struct AnthropicProvider {
    endpoint: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

/// Request body for the Messages API
#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// Response from the Messages API
#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: ResponseUsage,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct ResponseUsage {
    input_tokens: u64,
    output_tokens: u64,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(crate::DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::Communication(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }

    /// Point the provider at a different endpoint (proxies, tests)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn build_body<'a>(&'a self, request: &'a GenerationRequest) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens: request.max_output_tokens,
            temperature: 0.0,
            system: request.system.as_deref(),
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
        }
    }

    fn parse_body(body: &str) -> Result<Completion, LlmError> {
        let response: MessagesResponse = serde_json::from_str(body)
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let text: String = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect();

        Ok(Completion {
            text,
            usage: TokenUsage::new(response.usage.input_tokens, response.usage.output_tokens),
        })
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Completion, LlmError> {
        let url = format!("{}/v1/messages", self.endpoint);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.build_body(request))
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::Communication(format!("Failed to read response: {}", e)))?;

        match status {
            200..=299 => {
                let completion = Self::parse_body(&body)?;
                debug!(
                    "anthropic tokens - input: {}, output: {}",
                    completion.usage.input_tokens, completion.usage.output_tokens
                );
                Ok(completion)
            }
            // 529: API overloaded, handled like throttling
            529 => Err(LlmError::RateLimitExceeded(format!("anthropic overloaded: {}", body))),
            _ => Err(error_for_status(status, &body, "anthropic")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anthropic_provider_creation() {
        let provider = AnthropicProvider::new("key", DEFAULT_MODEL).unwrap();
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(provider.model(), DEFAULT_MODEL);
        assert_eq!(provider.name(), "anthropic");
    }

    #[test]
    fn test_request_body_shape() {
        let provider = AnthropicProvider::new("key", "claude-test").unwrap();
        let request = GenerationRequest::new("Fragmento 1/1")
            .with_system("Eres un analista")
            .with_max_output_tokens(1234);

        let body = serde_json::to_value(provider.build_body(&request)).unwrap();
        assert_eq!(body["model"], "claude-test");
        assert_eq!(body["max_tokens"], 1234);
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["system"], "Eres un analista");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Fragmento 1/1");
    }

    #[test]
    fn test_request_body_without_system() {
        let provider = AnthropicProvider::new("key", "claude-test").unwrap();
        let request = GenerationRequest::new("hola");
        let body = serde_json::to_value(provider.build_body(&request)).unwrap();
        assert!(body.get("system").is_none());
    }

    #[test]
    fn test_parse_body_collects_text_and_usage() {
        let body = r#"{
            "id": "msg_1",
            "content": [
                {"type": "text", "text": "{\"categorias_encontradas\": "},
                {"type": "text", "text": "[]}"}
            ],
            "model": "claude-test",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 1200, "output_tokens": 40}
        }"#;

        let completion = AnthropicProvider::parse_body(body).unwrap();
        assert_eq!(completion.text, r#"{"categorias_encontradas": []}"#);
        assert_eq!(completion.usage, TokenUsage::new(1200, 40));
    }

    #[test]
    fn test_parse_body_rejects_garbage() {
        let err = AnthropicProvider::parse_body("not json").unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_anthropic_error_handling() {
        // Nothing listens on the discard port
        let provider = AnthropicProvider::new("key", DEFAULT_MODEL)
            .unwrap()
            .with_endpoint("http://127.0.0.1:9");

        let result = provider.generate(&GenerationRequest::new("test")).await;
        match result {
            Err(LlmError::Communication(_)) => {}
            other => panic!("Expected Communication error, got {:?}", other),
        }
    }

    #[tokio::test]
    #[ignore] // Only run with ANTHROPIC_API_KEY set
    async fn test_anthropic_generate_integration() {
        let key = std::env::var("ANTHROPIC_API_KEY").unwrap_or_default();
        let provider = AnthropicProvider::new(key, DEFAULT_MODEL).unwrap();
        let result = provider
            .generate(&GenerationRequest::new("Responde solo con {}").with_max_output_tokens(10))
            .await;

        if let Ok(completion) = result {
            assert!(!completion.text.is_empty());
        }
    }
}
