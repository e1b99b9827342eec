//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid pipeline settings
    #[error(transparent)]
    Analyzer(#[from] lectora_analyzer::AnalyzerError),

    /// Backend could not be created
    #[error("LLM error: {0}")]
    Llm(#[from] lectora_llm::LlmError),

    /// Input documents could not be located
    #[error(transparent)]
    Source(#[from] lectora_analyzer::SourceError),

    /// Logging could not be initialized
    #[error("Logging error: {0}")]
    Logging(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
