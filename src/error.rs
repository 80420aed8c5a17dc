//! Error types for stage loading and session start

use thiserror::Error;

/// Errors raised when a tuning session cannot be set up
///
/// Nothing here is produced by a tick; per-frame anomalies degrade to
/// neutral values instead.
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("no stage configuration for chapter {chapter}")]
    ConfigurationMissing { chapter: u32 },
    #[error("no stage loaded; initialize before restarting")]
    NotInitialized,
    #[error("invalid stage configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to parse stage table: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read stage table: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TuningError>;
