use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Config, LogFormat};

/// Route `tracing` output to the log file in the data directory.
/// The terminal belongs to the TUI, so nothing is written to stderr.
pub(crate) fn init(config: &Config) -> Result<()> {
    config.ensure_data_dir()?;
    let path = config.log_path();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    let writer = Mutex::new(file);

    match config.log_format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(writer),
            )
            .try_init(),
    }
    .context("Failed to install log subscriber")?;

    tracing::info!(api = %config.api_url, "pftui {} starting", env!("CARGO_PKG_VERSION"));
    Ok(())
}
