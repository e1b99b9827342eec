//! Lectora LLM Provider Layer
//!
//! Interchangeable text-understanding backends behind one trait.
//!
//! # Architecture
//!
//! The analyzer only talks to [`LlmProvider`]. Backends are selected by
//! configuration through the [`Backend`] tagged variant, so there is one
//! analysis pipeline regardless of which service answers.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic, scriptable mock for testing
//! - `AnthropicProvider`: Anthropic Messages API
//! - `GeminiProvider`: Google Gemini `generateContent` API
//!
//! # Examples
//!
//! ```
//! use lectora_llm::{GenerationRequest, LlmProvider, MockProvider};
//!
//! # async fn example() -> Result<(), lectora_llm::LlmError> {
//! let provider = MockProvider::new(r#"{"categorias_encontradas": []}"#);
//! let completion = provider.generate(&GenerationRequest::new("prompt")).await?;
//! assert_eq!(completion.text, r#"{"categorias_encontradas": []}"#);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod anthropic;
pub mod backend;
pub mod gemini;

use async_trait::async_trait;
use lectora_domain::TokenUsage;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub use anthropic::AnthropicProvider;
pub use backend::{Backend, BackendKind};
pub use gemini::GeminiProvider;

/// Default timeout for a single generation request (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit or quota exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Credentials rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// Whether the service signalled throttling or quota exhaustion
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, LlmError::RateLimitExceeded(_))
    }
}

/// Build an error from a non-success HTTP status
pub(crate) fn error_for_status(status: u16, body: &str, provider: &str) -> LlmError {
    match status {
        401 | 403 => LlmError::Authentication(format!("{}: {}", provider, body)),
        404 => LlmError::ModelNotAvailable(format!("{}: {}", provider, body)),
        429 => LlmError::RateLimitExceeded(format!("{}: {}", provider, body)),
        _ => LlmError::Communication(format!("{} HTTP {}: {}", provider, status, body)),
    }
}

/// A single generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Optional system instruction
    pub system: Option<String>,
    /// User prompt
    pub prompt: String,
    /// Output token ceiling
    pub max_output_tokens: u32,
    /// Ask the backend for a JSON-only response when supported
    pub json_output: bool,
}

impl GenerationRequest {
    /// Default output ceiling when none is configured
    pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 3000;

    /// Create a request with default settings
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_output_tokens: Self::DEFAULT_MAX_OUTPUT_TOKENS,
            json_output: true,
        }
    }

    /// Set the system instruction
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the output token ceiling
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }
}

/// Text returned by a backend plus the tokens it reported
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Generated text
    pub text: String,
    /// Tokens consumed by this call
    pub usage: TokenUsage,
}

/// Trait implemented by every text-understanding backend
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &str;

    /// Model identifier
    fn model(&self) -> &str;

    /// Generate a completion
    async fn generate(&self, request: &GenerationRequest) -> Result<Completion, LlmError>;
}

/// Scripted reply of the [`MockProvider`]
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Successful completion with this text
    Text(String),
    /// Rate-limit failure
    RateLimited,
    /// Any other failure
    Fail(String),
}

#[derive(Debug, Default)]
struct MockState {
    queue: VecDeque<MockReply>,
    rules: Vec<(String, MockReply)>,
    prompts: Vec<String>,
    call_count: usize,
}

/// Mock LLM provider for deterministic testing
///
/// Replies are chosen in this order: the next queued reply, the first rule
/// whose needle occurs in the prompt or system instruction, then the
/// default text. No network calls are made.
///
/// # Examples
///
/// ```
/// use lectora_llm::{GenerationRequest, LlmProvider, MockProvider, MockReply};
///
/// # async fn example() {
/// let provider = MockProvider::new("fallback");
/// provider.add_response("Fragmento 1/2", r#"{"categorias_encontradas": []}"#);
/// provider.enqueue(MockReply::RateLimited);
///
/// let request = GenerationRequest::new("Fragmento 1/2 del programa");
/// assert!(provider.generate(&request).await.is_err());
/// assert!(provider.generate(&request).await.is_ok());
/// assert_eq!(provider.call_count(), 2);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    usage: TokenUsage,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            usage: TokenUsage::new(100, 50),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Set the usage reported by every successful reply
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Respond with `response` whenever the prompt contains `needle`
    pub fn add_response(&self, needle: impl Into<String>, response: impl Into<String>) {
        self.add_rule(needle, MockReply::Text(response.into()));
    }

    /// Fail whenever the prompt contains `needle`
    pub fn add_error(&self, needle: impl Into<String>) {
        self.add_rule(needle, MockReply::Fail("Mock error".to_string()));
    }

    /// Report throttling whenever the prompt contains `needle`
    pub fn add_rate_limit(&self, needle: impl Into<String>) {
        self.add_rule(needle, MockReply::RateLimited);
    }

    fn add_rule(&self, needle: impl Into<String>, reply: MockReply) {
        self.state().rules.push((needle.into(), reply));
    }

    /// Queue a one-shot reply, consumed before any rule
    pub fn enqueue(&self, reply: MockReply) {
        self.state().queue.push_back(reply);
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.state().call_count
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.state().call_count = 0;
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.state().prompts.clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Completion, LlmError> {
        let reply = {
            let mut state = self.state();
            state.call_count += 1;
            state.prompts.push(request.prompt.clone());

            match state.queue.pop_front() {
                Some(reply) => reply,
                None => {
                    let system = request.system.as_deref().unwrap_or("");
                    state
                        .rules
                        .iter()
                        .find(|(needle, _)| {
                            request.prompt.contains(needle.as_str()) || system.contains(needle.as_str())
                        })
                        .map(|(_, reply)| reply.clone())
                        .unwrap_or_else(|| MockReply::Text(self.default_response.clone()))
                }
            }
        };

        match reply {
            MockReply::Text(text) => Ok(Completion {
                text,
                usage: self.usage,
            }),
            MockReply::RateLimited => Err(LlmError::RateLimitExceeded("Mock quota".to_string())),
            MockReply::Fail(message) => Err(LlmError::Other(message)),
        }
    }
}
