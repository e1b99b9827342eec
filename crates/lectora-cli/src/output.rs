//! Output artifact and run summary.

use crate::error::Result;
use lectora_analyzer::RunReport;
use lectora_domain::{Pricing, TokenUsage};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Write `report` as pretty-printed JSON, creating the parent directory.
pub fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;

    info!("Results saved to {}", path.display());
    Ok(())
}

/// What a run consumed and produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Backend name
    pub backend: String,
    /// Model identifier
    pub model: String,
    /// Documents discovered
    pub discovered: usize,
    /// Documents written to the report
    pub processed: usize,
    /// Output artifact
    pub output: PathBuf,
    /// Tokens consumed by successful calls
    pub usage: TokenUsage,
    /// Backend pricing
    pub pricing: Pricing,
}

impl RunSummary {
    /// Estimated cost in USD
    pub fn estimated_cost(&self) -> f64 {
        self.usage.estimated_cost(&self.pricing)
    }

    /// Emit the summary through the log.
    pub fn log(&self) {
        for line in self.to_string().lines() {
            info!("{}", line);
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Analysis complete")?;
        writeln!(f, "  Backend: {} ({})", self.backend, self.model)?;
        writeln!(f, "  Programs processed: {}/{}", self.processed, self.discovered)?;
        writeln!(f, "  Output: {}", self.output.display())?;
        writeln!(f, "  Input tokens: {}", self.usage.input_tokens)?;
        writeln!(f, "  Output tokens: {}", self.usage.output_tokens)?;
        writeln!(f, "  Total tokens: {}", self.usage.total())?;
        write!(f, "  Estimated cost: ${:.4} USD", self.estimated_cost())
    }
}
