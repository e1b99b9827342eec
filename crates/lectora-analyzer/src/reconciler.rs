//! Reconciliation of per-fragment results into one record per document
//!
//! The service's synthesis call is tried first. When it fails, the
//! deterministic [`Reconciler::merge`] builds the record locally. Either
//! way the result holds exactly one record per canonical category.

use crate::service::TextAnalysisService;
use lectora_domain::{
    Category, CategoryFinding, CategoryRecord, Metadata, PartialAnalysis, Synthesis, TokenUsage,
};
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

/// Quotes kept per category by the local merge
pub const MAX_QUOTES_PER_CATEGORY: usize = 5;

/// Merges partial analyses into a [`Synthesis`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciler {
    max_quotes: usize,
}

impl Reconciler {
    /// Create a reconciler with the default quote cap
    pub fn new() -> Self {
        Self {
            max_quotes: MAX_QUOTES_PER_CATEGORY,
        }
    }

    /// Consolidate `partials` for one document
    ///
    /// Empty partials are ignored. With nothing left, the all-absent
    /// skeleton is returned without calling the service. A failed
    /// synthesis call falls back to [`Reconciler::merge`].
    pub async fn reconcile<S>(
        &self,
        service: &S,
        partials: &[PartialAnalysis],
        lead_text: &str,
        metadata: Metadata,
        usage: &mut TokenUsage,
    ) -> Synthesis
    where
        S: TextAnalysisService + ?Sized,
    {
        let valid: Vec<PartialAnalysis> = partials.iter().filter(|p| !p.is_empty()).cloned().collect();

        if valid.is_empty() {
            warn!("No valid partial analyses to synthesize, returning empty record");
            return Synthesis::skeleton(metadata);
        }

        match service.synthesize(&valid, lead_text, &metadata, usage).await {
            Ok(synthesis) => synthesis,
            Err(failure) => {
                warn!("Synthesis failed ({}), using local merge", failure);
                self.merge(&valid, metadata)
            }
        }
    }

    /// Deterministic local merge
    ///
    /// Findings are grouped by category. The first perspective seen for a
    /// category is kept, proposals and quotes are concatenated, and quotes
    /// are deduplicated (first occurrence wins) and capped.
    pub fn merge(&self, partials: &[PartialAnalysis], metadata: Metadata) -> Synthesis {
        let grouped = self.group(partials);
        info!("Local merge: {} categories with findings", grouped.len());
        Synthesis::from_records(metadata, grouped.into_values().map(CategoryRecord::from_finding))
    }

    /// Add findings from a reanalysis pass
    ///
    /// Only categories not already present are installed; present records
    /// are never touched. Returns the categories that were added.
    pub fn merge_reanalysis(
        &self,
        synthesis: &mut Synthesis,
        partials: &[PartialAnalysis],
    ) -> Vec<Category> {
        let mut added = Vec::new();
        for (category, finding) in self.group(partials) {
            if synthesis.insert_if_absent(CategoryRecord::from_finding(finding)) {
                info!("Reanalysis added category: {}", category);
                added.push(category);
            }
        }
        info!("Reanalysis merged: {} new categories", added.len());
        added
    }

    fn group(&self, partials: &[PartialAnalysis]) -> BTreeMap<Category, CategoryFinding> {
        let mut grouped: BTreeMap<Category, CategoryFinding> = BTreeMap::new();

        for finding in partials.iter().flat_map(|p| p.findings.iter()) {
            let entry = grouped.entry(finding.category).or_insert_with(|| {
                let mut first = CategoryFinding::new(finding.category);
                first.perspective = finding.perspective.clone();
                first
            });
            entry.proposals.extend(finding.proposals.iter().cloned());
            entry.quotes.extend(finding.quotes.iter().cloned());
        }

        for finding in grouped.values_mut() {
            let mut seen = HashSet::new();
            finding.quotes.retain(|q| seen.insert(q.clone()));
            finding.quotes.truncate(self.max_quotes);
        }

        grouped
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}
