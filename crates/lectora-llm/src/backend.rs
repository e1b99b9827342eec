//! Backend selection
//!
//! Configuration picks one backend kind; [`Backend`] wraps the matching
//! provider so the rest of the pipeline is written once against
//! [`LlmProvider`].

use crate::{
    anthropic, gemini, AnthropicProvider, Completion, GeminiProvider, GenerationRequest, LlmError,
    LlmProvider, MockProvider,
};
use async_trait::async_trait;
use lectora_domain::Pricing;
use std::fmt;
use std::str::FromStr;

/// Remote backend families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Anthropic Claude models
    Anthropic,
    /// Google Gemini models
    Gemini,
}

impl BackendKind {
    /// Model used when none is configured
    pub fn default_model(self) -> &'static str {
        match self {
            BackendKind::Anthropic => anthropic::DEFAULT_MODEL,
            BackendKind::Gemini => gemini::DEFAULT_MODEL,
        }
    }

    /// Pause after each successful call, in seconds
    pub fn default_throttle_secs(self) -> u64 {
        match self {
            BackendKind::Anthropic => 15,
            BackendKind::Gemini => 0,
        }
    }

    /// USD per million tokens, used for the cost estimate in the run summary
    pub fn pricing(self) -> Pricing {
        match self {
            BackendKind::Anthropic => Pricing::new(3.0, 15.0),
            BackendKind::Gemini => Pricing::new(0.0, 0.0),
        }
    }

    /// The other backend, used when only its key is available
    pub fn alternate(self) -> Self {
        match self {
            BackendKind::Anthropic => BackendKind::Gemini,
            BackendKind::Gemini => BackendKind::Anthropic,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Anthropic => write!(f, "claude"),
            BackendKind::Gemini => write!(f, "gemini"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "claude" | "anthropic" => Ok(BackendKind::Anthropic),
            "gemini" | "google" => Ok(BackendKind::Gemini),
            other => Err(LlmError::Other(format!("Unknown LLM provider: {}", other))),
        }
    }
}

/// The configured backend
pub enum Backend {
    /// Anthropic Messages API
    Anthropic(AnthropicProvider),
    /// Gemini generateContent API
    Gemini(GeminiProvider),
    /// Scripted provider for tests and dry runs
    Mock(MockProvider),
}

impl Backend {
    /// Build a remote backend for `kind`
    pub fn connect(
        kind: BackendKind,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        Ok(match kind {
            BackendKind::Anthropic => Backend::Anthropic(AnthropicProvider::new(api_key, model)?),
            BackendKind::Gemini => Backend::Gemini(GeminiProvider::new(api_key, model)?),
        })
    }

    fn inner(&self) -> &dyn LlmProvider {
        match self {
            Backend::Anthropic(p) => p,
            Backend::Gemini(p) => p,
            Backend::Mock(p) => p,
        }
    }
}

#[async_trait]
impl LlmProvider for Backend {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn model(&self) -> &str {
        self.inner().model()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Completion, LlmError> {
        self.inner().generate(request).await
    }
}
