//! Completeness checks against the 16-category taxonomy

use lectora_domain::{Category, Synthesis, CATEGORY_COUNT};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Most missing categories for which a focused second pass is attempted
///
/// Beyond this many, the program most likely does not address those topics.
pub const REANALYSIS_THRESHOLD: usize = 8;

/// Result of a completeness check
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Categories flagged present
    pub found: BTreeSet<Category>,

    /// Canonical categories not flagged present
    pub missing: BTreeSet<Category>,

    /// Percentage of categories present (0-100)
    pub coverage: f64,

    /// Whether nothing is missing
    pub is_complete: bool,
}

/// Checks a synthesis for missing categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletenessValidator {
    reanalysis_threshold: usize,
}

impl CompletenessValidator {
    /// Create a validator with the default threshold
    pub fn new() -> Self {
        Self {
            reanalysis_threshold: REANALYSIS_THRESHOLD,
        }
    }

    /// Override the reanalysis threshold
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.reanalysis_threshold = threshold;
        self
    }

    /// Compute found and missing categories and coverage
    pub fn validate(&self, synthesis: &Synthesis) -> ValidationResult {
        let found: BTreeSet<Category> = synthesis.present_categories().into_iter().collect();
        let missing: BTreeSet<Category> = Category::ALL
            .iter()
            .copied()
            .filter(|c| !found.contains(c))
            .collect();

        let coverage = 100.0 * found.len() as f64 / CATEGORY_COUNT as f64;
        let result = ValidationResult {
            is_complete: missing.is_empty(),
            found,
            missing,
            coverage,
        };
        log_validation(&result);
        result
    }

    /// Whether a focused second pass is worth its cost
    ///
    /// True only when between 1 and the threshold categories are missing.
    pub fn should_reanalyze(&self, result: &ValidationResult) -> bool {
        let missing = result.missing.len();
        if missing == 0 {
            return false;
        }
        if missing > self.reanalysis_threshold {
            info!(
                "No reanalysis: {} categories missing, the program most likely does not cover them",
                missing
            );
            return false;
        }
        info!("Reanalysis recommended for {} missing categories", missing);
        true
    }

    /// Log the final per-document summary
    pub fn log_summary(&self, synthesis: &Synthesis, document_name: &str) {
        let metadata = synthesis.metadata();
        info!("Final summary: {}", document_name);
        info!("Candidate: {}", metadata.candidate);
        info!("Party: {}", metadata.party);
        info!("Year: {}", metadata.year);

        let mut total_proposals = 0;
        let mut total_quotes = 0;
        let mut with_content = 0;

        for record in synthesis.records().iter().filter(|r| r.present) {
            with_content += 1;
            total_proposals += record.proposals.len();
            total_quotes += record.quotes.len();
            info!(
                "  {}: {} proposals, {} quotes",
                record.category,
                record.proposals.len(),
                record.quotes.len()
            );
        }

        info!(
            "Totals: {}/{} categories, {} proposals, {} quotes",
            with_content, CATEGORY_COUNT, total_proposals, total_quotes
        );
    }
}

impl Default for CompletenessValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn log_validation(result: &ValidationResult) {
    info!(
        "Completeness: {}/{} categories ({:.1}%)",
        result.found.len(),
        CATEGORY_COUNT,
        result.coverage
    );
    if result.is_complete {
        info!("Analysis complete, every category present");
        return;
    }
    warn!("Missing categories ({}):", result.missing.len());
    for category in &result.missing {
        warn!("  - {}", category);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectora_domain::{CategoryRecord, Metadata};

    fn synthesis_with(present: &[Category]) -> Synthesis {
        let records = present.iter().map(|c| {
            let mut record = CategoryRecord::absent(*c);
            record.present = true;
            record
        });
        Synthesis::from_records(Metadata::unspecified(), records)
    }

    #[test]
    fn test_coverage_is_exact() {
        let validator = CompletenessValidator::new();
        for n in 0..=CATEGORY_COUNT {
            let result = validator.validate(&synthesis_with(&Category::ALL[..n]));
            assert_eq!(result.coverage, 100.0 * n as f64 / 16.0);
            assert_eq!(result.found.len(), n);
            assert_eq!(result.missing.len(), CATEGORY_COUNT - n);
            assert_eq!(result.is_complete, n == CATEGORY_COUNT);
        }
    }

    #[test]
    fn test_missing_is_complement_of_found() {
        let validator = CompletenessValidator::new();
        let result = validator.validate(&synthesis_with(&[Category::Salud, Category::Educacion]));

        assert!(result.found.contains(&Category::Salud));
        assert!(!result.missing.contains(&Category::Salud));
        assert!(result.missing.contains(&Category::Economia));
        assert_eq!(result.coverage, 12.5);
    }

    #[test]
    fn test_should_reanalyze_window() {
        let validator = CompletenessValidator::new();
        for present in 0..=CATEGORY_COUNT {
            let result = validator.validate(&synthesis_with(&Category::ALL[..present]));
            let missing = CATEGORY_COUNT - present;
            let expected = (1..=8).contains(&missing);
            assert_eq!(
                validator.should_reanalyze(&result),
                expected,
                "missing = {}",
                missing
            );
        }
    }

    #[test]
    fn test_custom_threshold() {
        let validator = CompletenessValidator::new().with_threshold(2);
        let result = validator.validate(&synthesis_with(&Category::ALL[..13]));
        assert!(!validator.should_reanalyze(&result));
    }
}
