//! Lectora Domain Layer
//!
//! Data model for analyzing electoral programs against a fixed taxonomy.
//! This crate holds no I/O: it defines the values every other layer
//! passes around.
//!
//! ## Key Concepts
//!
//! - **Category**: one of 16 canonical topics every synthesis accounts for
//! - **Document / Fragment**: extracted program text and its model-sized pieces
//! - **PartialAnalysis**: what the analysis service found in one fragment
//! - **Synthesis**: one consolidated record per document, exactly 16 categories
//! - **TokenUsage**: monotonically growing token totals

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod category;
pub mod document;
pub mod usage;

// Re-exports for convenience
pub use analysis::{
    CategoryFinding, CategoryRecord, Metadata, PartialAnalysis, Perspective, Proposal, Synthesis,
    UNSPECIFIED,
};
pub use category::{Category, CATEGORY_COUNT};
pub use document::{truncate_chars, Document, Fragment, LEAD_TEXT_CHARS};
pub use usage::{Pricing, TokenUsage};
