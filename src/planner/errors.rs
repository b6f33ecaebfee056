//! Query compilation errors
//!
//! Error codes:
//! - INSIGHT_MALFORMED_QUERY (REJECT)
//! - INSIGHT_INVALID_KEY (REJECT)
//! - INSIGHT_CROSS_DATASET (REJECT)
//! - INSIGHT_INVALID_FILTER (REJECT)
//! - INSIGHT_INVALID_PATTERN (REJECT)
//! - INSIGHT_INVALID_COLUMN (REJECT)
//! - INSIGHT_SORT_KEY_NOT_SELECTED (REJECT)
//! - INSIGHT_DUPLICATE_APPLY_KEY (REJECT)
//! - INSIGHT_NON_NUMERIC_AGGREGATE (REJECT)

use std::fmt;

/// Severity levels for compilation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client query rejected before touching any record
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Compilation error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorCode {
    /// Wrong top-level shape or key set
    InsightMalformedQuery,
    /// Unknown field, malformed key, or wrong field kind
    InsightInvalidKey,
    /// Keys from more than one dataset id
    InsightCrossDataset,
    /// Filter document violates the grammar
    InsightInvalidFilter,
    /// IS pattern with an interior wildcard
    InsightInvalidPattern,
    /// Column outside the allowed scope
    InsightInvalidColumn,
    /// ORDER references a key missing from COLUMNS
    InsightSortKeyNotSelected,
    /// Two APPLY rules declare the same name
    InsightDuplicateApplyKey,
    /// MAX/MIN/AVG/SUM over a textual field
    InsightNonNumericAggregate,
}

impl QueryErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            QueryErrorCode::InsightMalformedQuery => "INSIGHT_MALFORMED_QUERY",
            QueryErrorCode::InsightInvalidKey => "INSIGHT_INVALID_KEY",
            QueryErrorCode::InsightCrossDataset => "INSIGHT_CROSS_DATASET",
            QueryErrorCode::InsightInvalidFilter => "INSIGHT_INVALID_FILTER",
            QueryErrorCode::InsightInvalidPattern => "INSIGHT_INVALID_PATTERN",
            QueryErrorCode::InsightInvalidColumn => "INSIGHT_INVALID_COLUMN",
            QueryErrorCode::InsightSortKeyNotSelected => "INSIGHT_SORT_KEY_NOT_SELECTED",
            QueryErrorCode::InsightDuplicateApplyKey => "INSIGHT_DUPLICATE_APPLY_KEY",
            QueryErrorCode::InsightNonNumericAggregate => "INSIGHT_NON_NUMERIC_AGGREGATE",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for QueryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Compilation error with the offending key or value
#[derive(Debug, Clone, PartialEq)]
pub struct QueryError {
    code: QueryErrorCode,
    message: String,
    key: Option<String>,
}

impl QueryError {
    fn new(code: QueryErrorCode, message: String, key: Option<String>) -> Self {
        Self { code, message, key }
    }

    /// Create a malformed query error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::InsightMalformedQuery, reason.into(), None)
    }

    /// Create an invalid key error
    pub fn invalid_key(key: impl Into<String>, reason: impl AsRef<str>) -> Self {
        let k = key.into();
        Self::new(
            QueryErrorCode::InsightInvalidKey,
            format!("Invalid key '{}': {}", k, reason.as_ref()),
            Some(k),
        )
    }

    /// Create a cross-dataset error
    pub fn cross_dataset(expected: &str, key: impl Into<String>) -> Self {
        let k = key.into();
        Self::new(
            QueryErrorCode::InsightCrossDataset,
            format!(
                "Key '{}' references a different dataset; query is bound to '{}'",
                k, expected
            ),
            Some(k),
        )
    }

    /// Create an invalid filter error
    pub fn invalid_filter(reason: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::InsightInvalidFilter, reason.into(), None)
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern(pattern: impl Into<String>) -> Self {
        let p = pattern.into();
        Self::new(
            QueryErrorCode::InsightInvalidPattern,
            format!("Pattern '{}' may only use '*' as first or last character", p),
            Some(p),
        )
    }

    /// Create an invalid column error
    pub fn invalid_column(column: impl Into<String>, reason: impl AsRef<str>) -> Self {
        let c = column.into();
        Self::new(
            QueryErrorCode::InsightInvalidColumn,
            format!("Invalid column '{}': {}", c, reason.as_ref()),
            Some(c),
        )
    }

    /// Create a sort key not selected error
    pub fn sort_key_not_selected(key: impl Into<String>) -> Self {
        let k = key.into();
        Self::new(
            QueryErrorCode::InsightSortKeyNotSelected,
            format!("ORDER key '{}' must appear in COLUMNS", k),
            Some(k),
        )
    }

    /// Create a duplicate apply key error
    pub fn duplicate_apply_key(key: impl Into<String>) -> Self {
        let k = key.into();
        Self::new(
            QueryErrorCode::InsightDuplicateApplyKey,
            format!("APPLY key '{}' is declared more than once", k),
            Some(k),
        )
    }

    /// Create a non-numeric aggregate error
    pub fn non_numeric_aggregate(token: &str, key: impl Into<String>) -> Self {
        let k = key.into();
        Self::new(
            QueryErrorCode::InsightNonNumericAggregate,
            format!("{} requires a numeric field, '{}' is textual", token, k),
            Some(k),
        )
    }

    /// Returns the error code
    pub fn code(&self) -> QueryErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending key or value, if any
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

impl fmt::Display for QueryError {
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

impl std::error::Error for QueryError {}

/// Result type for compilation
pub type QueryResult<T> = Result<T, QueryError>;
