//! Dataset store errors

use std::io;

use thiserror::Error;

/// Errors raised by the dataset store and record sources
#[derive(Debug, Error)]
pub enum StoreError {
    /// Dataset id is empty, whitespace-only, or contains an underscore
    #[error("invalid dataset id '{0}'")]
    InvalidId(String),

    #[error("dataset '{0}' already exists")]
    AlreadyExists(String),

    #[error("dataset '{0}' not found")]
    NotFound(String),

    /// A record failed normalization or catalog validation
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Persisted dataset bytes do not match the recorded checksum
    #[error("dataset '{id}' is corrupted: expected checksum {expected:08x}, found {actual:08x}")]
    Corrupted {
        id: String,
        expected: u32,
        actual: u32,
    },

    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("storage serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns a stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::InvalidId(_) => "INSIGHT_INVALID_DATASET_ID",
            StoreError::AlreadyExists(_) => "INSIGHT_DATASET_EXISTS",
            StoreError::NotFound(_) => "INSIGHT_DATASET_NOT_FOUND",
            StoreError::InvalidRecord(_) => "INSIGHT_INVALID_RECORD",
            StoreError::Corrupted { .. } => "INSIGHT_DATA_CORRUPTION",
            StoreError::Io(_) => "INSIGHT_STORAGE_IO_ERROR",
            StoreError::Json(_) => "INSIGHT_STORAGE_FORMAT_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
