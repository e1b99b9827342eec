//! Configuration for the analysis pipeline

use crate::error::AnalyzerError;
use std::time::Duration;

/// Approximate characters per token used to turn token budgets into
/// character budgets
pub const CHARS_PER_TOKEN: usize = 4;

/// Configuration for the analysis pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Maximum fragment size (characters)
    pub max_fragment_chars: usize,

    /// Overlap between consecutive fragments (characters)
    pub overlap_chars: usize,

    /// Output ceiling for fragment analysis and metadata calls (tokens)
    pub max_output_tokens_fragment: u32,

    /// Output ceiling for the synthesis call (tokens)
    pub max_output_tokens_synthesis: u32,

    /// Run the completeness check after synthesis
    pub enable_validation: bool,

    /// Run a focused second pass when a few categories are missing
    pub reanalyze_missing: bool,

    /// Attempts per external call
    pub max_retries: u32,

    /// Base wait after a rate-limit failure, doubled per attempt (milliseconds)
    pub backoff_base_ms: u64,

    /// Wait after a malformed or failed response (milliseconds)
    pub retry_delay_ms: u64,

    /// Pause after every successful call (milliseconds)
    pub throttle_ms: u64,
}

impl PipelineConfig {
    /// Build a config from token budgets, as they are usually expressed
    pub fn from_token_budgets(max_tokens_per_fragment: usize, overlap_tokens: usize) -> Self {
        Self {
            max_fragment_chars: max_tokens_per_fragment * CHARS_PER_TOKEN,
            overlap_chars: overlap_tokens * CHARS_PER_TOKEN,
            ..Self::default()
        }
    }

    /// Rate-limit backoff unit as a Duration
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    /// Fixed retry delay as a Duration
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Post-success pause as a Duration
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    /// Disable every pause; used by tests and dry runs
    pub fn without_delays(mut self) -> Self {
        self.backoff_base_ms = 0;
        self.retry_delay_ms = 0;
        self.throttle_ms = 0;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AnalyzerError> {
        if self.max_fragment_chars == 0 {
            return Err(AnalyzerError::Config(
                "max_fragment_chars must be greater than 0".to_string(),
            ));
        }
        if self.overlap_chars >= self.max_fragment_chars {
            return Err(AnalyzerError::Config(
                "overlap_chars must be smaller than max_fragment_chars".to_string(),
            ));
        }
        if self.max_output_tokens_fragment == 0 || self.max_output_tokens_synthesis == 0 {
            return Err(AnalyzerError::Config(
                "output token ceilings must be greater than 0".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(AnalyzerError::Config(
                "max_retries must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    /// 6000/600 token budgets, three attempts, one-second backoff unit
    fn default() -> Self {
        Self {
            max_fragment_chars: 6000 * CHARS_PER_TOKEN,
            overlap_chars: 600 * CHARS_PER_TOKEN,
            max_output_tokens_fragment: 3000,
            max_output_tokens_synthesis: 3000,
            enable_validation: true,
            reanalyze_missing: true,
            max_retries: 3,
            backoff_base_ms: 1000,
            retry_delay_ms: 2000,
            throttle_ms: 0,
        }
    }
}
