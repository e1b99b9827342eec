//! Per-document pipeline and run driver
//!
//! ```text
//! path → DocumentSource → Segmenter → analyze each fragment → metadata
//!      → Reconciler → CompletenessValidator → (one reanalysis pass) → record
//! ```
//!
//! Documents and fragments are processed strictly one after another: the
//! service enforces a shared throughput budget, so there is no fan-out.

use crate::config::PipelineConfig;
use crate::error::SourceError;
use crate::reconciler::Reconciler;
use crate::segmenter::Segmenter;
use crate::service::TextAnalysisService;
use crate::source::DocumentSource;
use crate::validator::{CompletenessValidator, ValidationResult};
use lectora_domain::{Category, Document, Fragment, PartialAnalysis, Synthesis, TokenUsage};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Focused reanalysis passes allowed per document
pub const MAX_REANALYSIS_PASSES: usize = 1;

/// Timestamp format used in output records
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Local time formatted for output records
pub fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Everything learned while analyzing one document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentOutcome {
    /// Final record
    pub synthesis: Synthesis,
    /// Fragments produced by the segmenter
    pub fragments: usize,
    /// Fragments the service analyzed, with or without findings
    pub analyzed: usize,
    /// Fragments whose analysis returned at least one finding
    pub with_findings: usize,
    /// Completeness check of the final record, when enabled
    pub validation: Option<ValidationResult>,
    /// Categories added by the reanalysis pass
    pub reanalysis_added: Vec<Category>,
    /// Category names the service returned that are not in the taxonomy
    pub rejected_categories: Vec<String>,
}

/// One document's entry in the run report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramRecord {
    /// Metadata and the 16 category records
    #[serde(flatten)]
    pub synthesis: Synthesis,
    /// Source file name
    pub pdf_filename: String,
    /// When the document finished processing
    pub processing_date: String,
}

/// The consolidated output of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// When the run finished
    pub fecha_analisis: String,
    /// Documents successfully processed
    pub total_candidatos: usize,
    /// Per-document records, in processing order
    pub candidatos: Vec<ProgramRecord>,
}

impl RunReport {
    /// Build a report stamped with the current time
    pub fn new(records: Vec<ProgramRecord>) -> Self {
        Self {
            fecha_analisis: timestamp(),
            total_candidatos: records.len(),
            candidatos: records,
        }
    }
}

/// Drives the analysis of program documents
pub struct AnalysisOrchestrator<S, D>
where
    S: TextAnalysisService,
    D: DocumentSource,
{
    service: S,
    source: D,
    segmenter: Segmenter,
    reconciler: Reconciler,
    validator: CompletenessValidator,
    enable_validation: bool,
    reanalyze_missing: bool,
}

impl<S, D> AnalysisOrchestrator<S, D>
where
    S: TextAnalysisService,
    D: DocumentSource,
{
    /// Create an orchestrator
    pub fn new(service: S, source: D, config: &PipelineConfig) -> Self {
        Self {
            service,
            source,
            segmenter: Segmenter::new(config.max_fragment_chars, config.overlap_chars),
            reconciler: Reconciler::new(),
            validator: CompletenessValidator::new(),
            enable_validation: config.enable_validation,
            reanalyze_missing: config.reanalyze_missing,
        }
    }

    /// Process every path in order
    ///
    /// Documents whose text cannot be extracted are logged and left out of
    /// the report; they never stop the run.
    pub async fn run(&self, paths: &[PathBuf], usage: &mut TokenUsage) -> RunReport {
        let mut records = Vec::new();

        for (i, path) in paths.iter().enumerate() {
            info!("Processing document {}/{}: {}", i + 1, paths.len(), path.display());
            match self.process(path, usage).await {
                Ok(record) => records.push(record),
                Err(e) => error!("Skipping {}: {}", path.display(), e),
            }
        }

        info!("Run complete: {}/{} documents processed", records.len(), paths.len());
        RunReport::new(records)
    }

    /// Extract, analyze and stamp one document
    pub async fn process(
        &self,
        path: &Path,
        usage: &mut TokenUsage,
    ) -> Result<ProgramRecord, SourceError> {
        let document = self.source.load(path).await?;
        let outcome = self.analyze_document(&document, usage).await;

        Ok(ProgramRecord {
            synthesis: outcome.synthesis,
            pdf_filename: document.name().to_string(),
            processing_date: timestamp(),
        })
    }

    /// Run the full pipeline over an extracted document
    pub async fn analyze_document(
        &self,
        document: &Document,
        usage: &mut TokenUsage,
    ) -> DocumentOutcome {
        let lead_text = document.lead_text();
        let fragments = self.segmenter.segment(document.text());
        info!("{}: {} fragments", document.name(), fragments.len());

        let mut partials = Vec::with_capacity(fragments.len());
        let mut rejected_categories = Vec::new();
        for fragment in &fragments {
            match self.service.analyze_fragment(fragment, usage).await {
                Ok(mut partial) => {
                    rejected_categories.append(&mut partial.rejected_categories);
                    partials.push(partial);
                }
                Err(failure) => warn!(
                    "Fragment {}/{} dropped: {}",
                    fragment.index, fragment.total, failure
                ),
            }
        }

        let analyzed = partials.len();
        let with_findings = partials.iter().filter(|p| !p.is_empty()).count();
        info!(
            "{}/{} fragments analyzed, {} with findings",
            analyzed,
            fragments.len(),
            with_findings
        );

        let metadata = self.service.extract_metadata(&lead_text, usage).await;
        let mut synthesis = self
            .reconciler
            .reconcile(&self.service, &partials, &lead_text, metadata, usage)
            .await;
        rejected_categories.extend(synthesis.take_rejected_categories());

        let mut validation = None;
        let mut reanalysis_added = Vec::new();
        if self.enable_validation {
            let mut result = self.validator.validate(&synthesis);
            let mut passes = 0;
            while self.reanalyze_missing
                && passes < MAX_REANALYSIS_PASSES
                && self.validator.should_reanalyze(&result)
            {
                passes += 1;
                let missing: Vec<Category> = result.missing.iter().copied().collect();
                let fresh = self
                    .reanalyze(&fragments, &missing, &mut rejected_categories, usage)
                    .await;
                reanalysis_added.extend(self.reconciler.merge_reanalysis(&mut synthesis, &fresh));
                result = self.validator.validate(&synthesis);
            }
            validation = Some(result);
        }

        if !rejected_categories.is_empty() {
            warn!(
                "{} findings named unknown categories: {:?}",
                rejected_categories.len(),
                rejected_categories
            );
        }
        self.validator.log_summary(&synthesis, document.name());

        DocumentOutcome {
            synthesis,
            fragments: fragments.len(),
            analyzed,
            with_findings,
            validation,
            reanalysis_added,
            rejected_categories,
        }
    }

    async fn reanalyze(
        &self,
        fragments: &[Fragment],
        missing: &[Category],
        rejected: &mut Vec<String>,
        usage: &mut TokenUsage,
    ) -> Vec<PartialAnalysis> {
        info!("Reanalyzing {} fragments for {} categories", fragments.len(), missing.len());

        let mut fresh = Vec::new();
        for fragment in fragments {
            match self.service.reanalyze_fragment(fragment, missing, usage).await {
                Ok(mut partial) => {
                    rejected.append(&mut partial.rejected_categories);
                    if !partial.is_empty() {
                        fresh.push(partial);
                    }
                }
                Err(failure) => warn!(
                    "Reanalysis of fragment {}/{} failed: {}",
                    fragment.index, fragment.total, failure
                ),
            }
        }
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectora_domain::Metadata;

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp();
        // 2025-01-31T12:34:56.123456
        assert_eq!(ts.len(), 26);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "T");
        assert_eq!(&ts[19..20], ".");
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = ProgramRecord {
            synthesis: Synthesis::skeleton(Metadata::unspecified()),
            pdf_filename: "programa.pdf".to_string(),
            processing_date: "2025-01-01T00:00:00.000000".to_string(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["pdf_filename"], "programa.pdf");
        assert_eq!(json["metadata"]["candidato"], "No especificado");
        assert_eq!(json["categorias"].as_array().map(Vec::len), Some(16));
        assert_eq!(json["categorias"][0]["presente"], false);
    }

    #[test]
    fn test_report_counts_records() {
        let report = RunReport::new(Vec::new());
        assert_eq!(report.total_candidatos, 0);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["candidatos"].as_array().is_some());
        assert!(json["fecha_analisis"].is_string());
    }
}
