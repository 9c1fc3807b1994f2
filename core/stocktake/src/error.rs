//! Error types for the stocktake binary.

use std::path::PathBuf;

/// Errors that can surface while setting up or running a count session.
///
/// Only the startup preconditions and a failed stdin read are fatal; every
/// per-record failure downstream is logged and skipped by the workers.
#[derive(Debug, thiserror::Error)]
pub enum StocktakeError {
    #[error("Failed to open log file {path}: {source}")]
    LogSink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open inventory database {path}: {source}")]
    StoreOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Failed to read input: {0}")]
    Input(#[source] std::io::Error),

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using StocktakeError.
pub type Result<T> = std::result::Result<T, StocktakeError>;
