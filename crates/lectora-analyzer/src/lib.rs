//! Lectora Analyzer
//!
//! Turns long government-program documents into one structured record per
//! candidate across a fixed 16-category policy taxonomy.
//!
//! # Overview
//!
//! Documents are too long for a single model call, so each one is split into
//! overlapping fragments, every fragment is analyzed on its own, and the
//! partial results are reconciled into a single record. A completeness check
//! then drives at most one focused reanalysis pass for missing categories.
//!
//! # Architecture
//!
//! ```text
//! Document → Segmenter → Fragments → TextAnalysisService → PartialAnalysis
//!          → Reconciler → Synthesis → CompletenessValidator → ProgramRecord
//! ```
//!
//! # Key Features
//!
//! - **Overlapping segmentation**: boundary-aware windows with guaranteed forward progress
//! - **Bounded retries**: exponential backoff for rate limits, a fixed delay for malformed replies
//! - **Graceful degradation**: a failed synthesis falls back to a deterministic local merge
//! - **Complete records**: every output holds exactly one entry per category
//!
//! # Example Usage
//!
//! ```no_run
//! use lectora_analyzer::{AnalysisOrchestrator, FileSource, PipelineConfig, ProgramAnalyzer};
//! use lectora_domain::TokenUsage;
//! use lectora_llm::MockProvider;
//! use std::path::PathBuf;
//!
//! # async fn example() {
//! let config = PipelineConfig::default();
//! let service = ProgramAnalyzer::new(MockProvider::new("{}"), &config);
//! let orchestrator = AnalysisOrchestrator::new(service, FileSource::new(), &config);
//!
//! let mut usage = TokenUsage::default();
//! let report = orchestrator
//!     .run(&[PathBuf::from("programas/candidato.pdf")], &mut usage)
//!     .await;
//!
//! println!("Processed: {} programs", report.total_candidatos);
//! println!("Tokens: {}", usage.total());
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod orchestrator;
mod parser;
mod prompt;
mod reconciler;
mod retry;
mod segmenter;
mod service;
mod source;
mod validator;

#[cfg(test)]
mod tests;

pub use config::{PipelineConfig, CHARS_PER_TOKEN};
pub use error::{AnalyzerError, SourceError};
pub use orchestrator::{
    timestamp, AnalysisOrchestrator, DocumentOutcome, ProgramRecord, RunReport,
    MAX_REANALYSIS_PASSES,
};
pub use parser::{parse_fragment_analysis, parse_metadata, parse_synthesis};
pub use reconciler::{Reconciler, MAX_QUOTES_PER_CATEGORY};
pub use retry::{CallError, FailureKind, Metered, RetryFailure, RetryPolicy};
pub use segmenter::Segmenter;
pub use service::{ProgramAnalyzer, TextAnalysisService};
pub use source::{discover_documents, DocumentKind, DocumentSource, FileSource, LEAD_PAGES};
pub use validator::{CompletenessValidator, ValidationResult, REANALYSIS_THRESHOLD};
