//! Run-level error kinds
//!
//! Every fatal condition the orchestrator can hit has its own variant so
//! callers and tests can match on structured outcomes instead of log text.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Required tool not found: {0}")]
    DependencyMissing(String),

    #[error("Database server unreachable: {0}")]
    ConnectivityFailed(String),

    #[error("Failed to enumerate databases: {0}")]
    EnumerationFailed(String),

    #[error("Dump failed for database '{database}' (target {path}): {reason}")]
    DumpFailed {
        database: String,
        path: PathBuf,
        reason: String,
    },

    #[error("Retention sweep failed: {0}")]
    SweepFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RunError>;
