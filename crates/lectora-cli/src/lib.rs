//! Lectora CLI library.
//!
//! This library provides the pieces behind the `lectora` binary: argument
//! parsing, environment configuration, logging setup, the run driver and
//! the output artifact.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;

pub use app::analyze;
pub use cli::Cli;
pub use config::AppConfig;
pub use error::{CliError, Result};
pub use logging::init_logging;
pub use output::{write_report, RunSummary};
