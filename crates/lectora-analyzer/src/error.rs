//! Error types for the analyzer

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while interpreting service output or driving the pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyzerError {
    /// The service named a category outside the taxonomy
    #[error("Unknown category returned by service: {0}")]
    UnknownCategory(String),

    /// Response does not have the expected structure
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for AnalyzerError {
    fn from(e: serde_json::Error) -> Self {
        AnalyzerError::JsonParse(e.to_string())
    }
}

/// Errors raised while locating or reading program documents
#[derive(Error, Debug)]
pub enum SourceError {
    /// The input directory holds no supported files
    #[error("No PDF or TXT files found in {0}")]
    NoDocuments(PathBuf),

    /// Text could not be extracted from a document
    #[error("Failed to extract text from {path}: {reason}")]
    Extraction {
        /// Offending file
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Filesystem error
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl SourceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SourceError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn extraction(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        SourceError::Extraction {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
