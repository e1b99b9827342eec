//! Logging setup: human-readable stderr output plus a plain per-run log file.

use crate::error::{CliError, Result};
use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Returns the log file path.
///
/// `RUST_LOG` controls verbosity; the default is `info`.
pub fn init_logging(logs_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(logs_dir)?;
    let path = logs_dir.join(log_file_name(&Local::now()));
    let file = File::create(&path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))?;

    Ok(path)
}

/// `analisis_<YYYYmmdd_HHMMSS>.log`
pub fn log_file_name<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("analisis_{}.log", now.format("%Y%m%d_%H%M%S"))
}
