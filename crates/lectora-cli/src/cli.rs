//! Command-line entry point.
//!
//! The binary takes no flags: behavior comes entirely from the environment
//! (see [`crate::config::AppConfig`]). Parsing still rejects stray
//! arguments and answers `--help` and `--version`.

use clap::Parser;

const ENVIRONMENT_HELP: &str = "\
Configuration (environment or .env):
  LLM_PROVIDER                   gemini | claude (default: gemini)
  GEMINI_KEY, ANTHROPIC_API_KEY  credentials
  GEMINI_MODEL, CLAUDE_MODEL     model identifiers
  MAX_TOKENS_PER_CHUNK           fragment budget in tokens (default: 6000)
  CHUNK_OVERLAP_TOKENS           fragment overlap in tokens (default: 600)
  MAX_TOKENS_OUTPUT_CHUNK        output ceiling per fragment (default: 3000)
  MAX_TOKENS_OUTPUT_SYNTHESIS    output ceiling for synthesis (default: 3000)
  ENABLE_VALIDATION              completeness check (default: true)
  REANALYZE_MISSING_CATEGORIES   focused second pass (default: true)
  MAX_RETRIES                    attempts per call (default: 3)
  THROTTLE_DELAY_SECS            pause after each call (default: 15 claude, 0 gemini)
  PROGRAMS_DIR                   input directory (default: pdfs)
  OUTPUT_FILE                    output JSON (default: output/analisis_consolidado.json)
  LOGS_DIR                       log directory (default: logs)
  DRY_RUN                        scripted backend, no API calls (default: false)
  RUST_LOG                       log filter (default: info)";

/// Lectora - Structured analysis of government programs.
#[derive(Debug, Parser)]
#[command(name = "lectora")]
#[command(version, about, long_about = None, after_help = ENVIRONMENT_HELP)]
pub struct Cli {}
