//! Engine error type
//!
//! Engine errors are pass-through: they keep the code of the subsystem
//! that raised them.

use thiserror::Error;

use crate::executor::ExecutorError;
use crate::planner::QueryError;
use crate::storage::StoreError;

/// Any failure surfaced by the query engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Query rejected at compile time
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Query failed while executing
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    /// Dataset management failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Returns the stable error code of the underlying failure
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Query(e) => e.code().code(),
            EngineError::Executor(e) => e.code().code(),
            EngineError::Store(e) => e.code(),
        }
    }

    /// Human-readable message without the code prefix
    pub fn message(&self) -> String {
        match self {
            EngineError::Query(e) => e.message().to_string(),
            EngineError::Executor(e) => e.message().to_string(),
            EngineError::Store(e) => e.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            EngineError::Query(_) => false,
            EngineError::Executor(e) => e.is_not_found(),
            EngineError::Store(e) => e.is_not_found(),
        }
    }

    /// True if the caller's input was at fault, not the engine
    pub fn is_rejection(&self) -> bool {
        match self {
            EngineError::Query(_) => true,
            EngineError::Executor(e) => !matches!(
                e.code(),
                crate::executor::ExecutorErrorCode::InsightExecutionFailed
            ),
            EngineError::Store(e) => !matches!(
                e,
                StoreError::Io(_) | StoreError::Json(_) | StoreError::Corrupted { .. }
            ),
        }
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
