//! Error types for tracker construction and status export.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors raised while building or configuring a tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// A configuration value failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be read.
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for `TrackerConfig`.
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Errors raised by a status sink. These never abort tracking.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize status records: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The background writer is still busy with the previous snapshot.
    #[error("Status writer busy, export skipped")]
    Busy,

    /// The background writer thread is gone.
    #[error("Status writer disconnected")]
    Disconnected,
}

impl TrackerError {
    pub(crate) fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
