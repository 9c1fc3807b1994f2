//! Logging setup.
//!
//! Every event is emitted once through `tracing` and fans out to two sinks:
//! the console and the append-only log file, both severity-tagged. The
//! returned guard must stay alive in `main` so buffered file lines flush on
//! exit, including the fatal-abort paths.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::StocktakeError;

pub fn init(log_path: &Path) -> Result<WorkerGuard, StocktakeError> {
    let file = fs_err::OpenOptions::new()
        .append(true)
        .create(true)
        .open(log_path)
        .map_err(|source| StocktakeError::LogSink {
            path: log_path.to_path_buf(),
            source,
        })?;

    let (writer, guard) = tracing_appender::non_blocking(file);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer),
        )
        .init();

    Ok(guard)
}
