//! Configuration management for the CLI.
//!
//! Settings come from the process environment (optionally seeded from a
//! `.env` file). Parsing goes through a lookup function so tests never touch
//! the real environment.

use crate::error::{CliError, Result};
use lectora_analyzer::PipelineConfig;
use lectora_domain::Pricing;
use lectora_llm::BackendKind;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

/// Default input directory
pub const DEFAULT_PROGRAMS_DIR: &str = "pdfs";

/// Default output artifact
pub const DEFAULT_OUTPUT_FILE: &str = "output/analisis_consolidado.json";

/// Default log directory
pub const DEFAULT_LOGS_DIR: &str = "logs";

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Selected backend
    pub backend: BackendKind,

    /// Model identifier for the selected backend
    pub model: String,

    /// Pipeline knobs
    pub pipeline: PipelineConfig,

    /// Input directory
    pub programs_dir: PathBuf,

    /// Output JSON file
    pub output_file: PathBuf,

    /// Log directory
    pub logs_dir: PathBuf,

    /// Use the scripted backend instead of a remote one
    pub dry_run: bool,

    gemini_key: Option<String>,
    anthropic_key: Option<String>,
    gemini_model: Option<String>,
    claude_model: Option<String>,
    throttle_secs: Option<u64>,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let backend = match get("LLM_PROVIDER") {
            Some(name) => name
                .parse::<BackendKind>()
                .map_err(|_| CliError::Config(format!("LLM_PROVIDER: unknown provider '{}'", name)))?,
            None => BackendKind::Gemini,
        };

        let max_tokens = parse_var(&get, "MAX_TOKENS_PER_CHUNK", 6000usize)?;
        let overlap_tokens = parse_var(&get, "CHUNK_OVERLAP_TOKENS", 600usize)?;

        let mut pipeline = PipelineConfig::from_token_budgets(max_tokens, overlap_tokens);
        pipeline.max_output_tokens_fragment = parse_var(&get, "MAX_TOKENS_OUTPUT_CHUNK", 3000u32)?;
        pipeline.max_output_tokens_synthesis =
            parse_var(&get, "MAX_TOKENS_OUTPUT_SYNTHESIS", 3000u32)?;
        pipeline.enable_validation = parse_bool(&get, "ENABLE_VALIDATION", true)?;
        pipeline.reanalyze_missing = parse_bool(&get, "REANALYZE_MISSING_CATEGORIES", true)?;
        pipeline.max_retries = parse_var(&get, "MAX_RETRIES", 3u32)?;
        pipeline.validate()?;

        let throttle_secs = get("THROTTLE_DELAY_SECS")
            .map(|v| {
                v.parse::<u64>()
                    .map_err(|_| CliError::Config(format!("THROTTLE_DELAY_SECS: invalid value '{}'", v)))
            })
            .transpose()?;

        let mut config = Self {
            backend,
            model: String::new(),
            pipeline,
            programs_dir: get("PROGRAMS_DIR").unwrap_or_else(|| DEFAULT_PROGRAMS_DIR.to_string()).into(),
            output_file: get("OUTPUT_FILE").unwrap_or_else(|| DEFAULT_OUTPUT_FILE.to_string()).into(),
            logs_dir: get("LOGS_DIR").unwrap_or_else(|| DEFAULT_LOGS_DIR.to_string()).into(),
            dry_run: parse_bool(&get, "DRY_RUN", false)?,
            gemini_key: get("GEMINI_KEY"),
            anthropic_key: get("ANTHROPIC_API_KEY"),
            gemini_model: get("GEMINI_MODEL"),
            claude_model: get("CLAUDE_MODEL"),
            throttle_secs,
        };
        config.select_backend(backend);

        Ok(config)
    }

    /// Switch to `kind`, picking up its model and throttle settings.
    pub fn select_backend(&mut self, kind: BackendKind) {
        self.backend = kind;
        self.model = self
            .model_override(kind)
            .map(str::to_string)
            .unwrap_or_else(|| kind.default_model().to_string());
        self.pipeline.throttle_ms = self
            .throttle_secs
            .unwrap_or(kind.default_throttle_secs())
            .saturating_mul(1000);
    }

    /// Credential configured for `kind`, if any.
    pub fn api_key(&self, kind: BackendKind) -> Option<&str> {
        match kind {
            BackendKind::Gemini => self.gemini_key.as_deref(),
            BackendKind::Anthropic => self.anthropic_key.as_deref(),
        }
    }

    /// Credential for the selected backend.
    ///
    /// When only the other backend has a key, switches to it with a
    /// warning. Fails when neither has one.
    pub fn resolve_credentials(&mut self) -> Result<String> {
        if let Some(key) = self.api_key(self.backend) {
            return Ok(key.to_string());
        }

        let alternate = self.backend.alternate();
        if let Some(key) = self.api_key(alternate).map(str::to_string) {
            warn!(
                "No API key configured for {}, falling back to {}",
                self.backend, alternate
            );
            self.select_backend(alternate);
            return Ok(key);
        }

        Err(CliError::Config(
            "No API key configured: set GEMINI_KEY or ANTHROPIC_API_KEY".to_string(),
        ))
    }

    /// Pricing of the selected backend.
    pub fn pricing(&self) -> Pricing {
        self.backend.pricing()
    }

    fn model_override(&self, kind: BackendKind) -> Option<&str> {
        match kind {
            BackendKind::Gemini => self.gemini_model.as_deref(),
            BackendKind::Anthropic => self.claude_model.as_deref(),
        }
    }
}

fn parse_var<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value
            .parse()
            .map_err(|_| CliError::Config(format!("{}: invalid value '{}'", key, value))),
        None => Ok(default),
    }
}

fn parse_bool<G>(get: &G, key: &str, default: bool) -> Result<bool>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => match value.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(CliError::Config(format!("{}: expected true or false, got '{}'", key, value))),
        },
        None => Ok(default),
    }
}
