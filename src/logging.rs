//! Console and file logging setup.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE_NAME: &str = "pomotimer.log";

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Could not open log file: {0}")]
    Io(#[from] io::Error),
    #[error("Logging already initialized: {0}")]
    Init(#[from] TryInitError),
}

/// Installs the global subscriber. The console shows `info` (or `debug`),
/// overridable through `RUST_LOG`; the log file in `log_dir`, when given,
/// always records `debug` and above. Returns the log file path.
pub fn init(debug: bool, log_dir: Option<&Path>) -> Result<Option<PathBuf>, LoggingError> {
    let default_level = if debug { "debug" } else { "info" };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let console = fmt::layer()
        .with_target(false)
        .with_filter(console_filter);

    let (file_layer, log_file) = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let path = dir.join(LOG_FILE_NAME);
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(LevelFilter::DEBUG);
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()?;

    if let Some(ref path) = log_file {
        tracing::info!("Logging to file: {}", path.display());
    }
    Ok(log_file)
}
