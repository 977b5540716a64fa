//! Tracing setup for the server: file log plus warnings on stderr.

use anyhow::{Context, Result};
use concierge_core::logs::LOG_FILE_NAME;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber. The guard must outlive the server.
pub fn init(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, LOG_FILE_NAME));

    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive("concierge=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .with(fmt::layer().with_writer(std::io::stderr).with_filter(LevelFilter::INFO))
        .init();

    Ok(guard)
}
