//! Error types for Mushaf

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MushafError {
    /// The resource answered, but not with a success status.
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// The resource could not be reached at all.
    #[error("Resource unreachable: {0}")]
    ResourceUnreachable(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for MushafError {
    fn from(e: serde_json::Error) -> Self {
        MushafError::Parse(e.to_string())
    }
}

/// Failures of the persistent key-value tier. Always recoverable.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage quota exceeded ({needed} bytes needed, {remaining} remaining)")]
    QuotaExceeded { needed: usize, remaining: usize },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}
