//! Execution errors
//!
//! Error codes:
//! - INSIGHT_DATASET_NOT_FOUND (ERROR)
//! - INSIGHT_RESULT_TOO_LARGE (ERROR)
//! - INSIGHT_EXECUTION_FAILED (ERROR)

use std::fmt;

/// Severity levels for execution errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Query failed, engine is healthy
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Execution error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorErrorCode {
    /// Referenced dataset has no loaded records
    InsightDatasetNotFound,
    /// Terminal row count exceeds the configured cap
    InsightResultTooLarge,
    /// Aggregation or record loading failed
    InsightExecutionFailed,
}

impl ExecutorErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorErrorCode::InsightDatasetNotFound => "INSIGHT_DATASET_NOT_FOUND",
            ExecutorErrorCode::InsightResultTooLarge => "INSIGHT_RESULT_TOO_LARGE",
            ExecutorErrorCode::InsightExecutionFailed => "INSIGHT_EXECUTION_FAILED",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Error
    }
}

impl fmt::Display for ExecutorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Execution error with context
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorError {
    code: ExecutorErrorCode,
    message: String,
    /// Offending dataset id, if applicable
    dataset_id: Option<String>,
}

impl ExecutorError {
    /// Create a dataset not found error
    pub fn dataset_not_found(dataset_id: impl Into<String>) -> Self {
        let id = dataset_id.into();
        Self {
            code: ExecutorErrorCode::InsightDatasetNotFound,
            message: format!("Dataset '{}' not found", id),
            dataset_id: Some(id),
        }
    }

    /// Create a result too large error
    pub fn result_too_large(rows: usize, limit: usize) -> Self {
        Self {
            code: ExecutorErrorCode::InsightResultTooLarge,
            message: format!("Query produced {} rows, limit is {}", rows, limit),
            dataset_id: None,
        }
    }

    /// Create an execution failed error
    pub fn execution_failed(reason: impl Into<String>) -> Self {
        Self {
            code: ExecutorErrorCode::InsightExecutionFailed,
            message: reason.into(),
            dataset_id: None,
        }
    }

    pub fn code(&self) -> ExecutorErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn dataset_id(&self) -> Option<&str> {
        self.dataset_id.as_deref()
    }

    pub fn is_not_found(&self) -> bool {
        self.code == ExecutorErrorCode::InsightDatasetNotFound
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for ExecutorError {}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ExecutorErrorCode::InsightDatasetNotFound.code(),
            "INSIGHT_DATASET_NOT_FOUND"
        );
        assert_eq!(
            ExecutorErrorCode::InsightResultTooLarge.code(),
            "INSIGHT_RESULT_TOO_LARGE"
        );
    }

    #[test]
    fn test_not_found_carries_dataset() {
        let err = ExecutorError::dataset_not_found("rooms");
        assert!(err.is_not_found());
        assert_eq!(err.dataset_id(), Some("rooms"));
    }

    #[test]
    fn test_error_display() {
        let err = ExecutorError::result_too_large(5001, 5000);
        let display = format!("{}", err);
        assert!(display.starts_with("[ERROR] INSIGHT_RESULT_TOO_LARGE"));
        assert!(display.contains("5001"));
        assert!(!err.is_not_found());
    }
}
