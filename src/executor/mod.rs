//! Query executor for insightdb
//!
//! Runs compiled queries over an already-loaded record collection.
//!
//! # Execution Flow (strict order)
//!
//! 1. Filter records
//! 2. Group and aggregate (TRANSFORMATIONS only)
//! 3. Project to COLUMNS
//! 4. Enforce the row cap
//! 5. Sort (ORDER only)
//!
//! Execution never mutates the records and holds no state between queries.

mod aggregate;
mod errors;
mod executor;
mod filters;
mod result;
mod sorter;

pub use aggregate::{round2, Aggregator};
pub use errors::{ExecutorError, ExecutorErrorCode, ExecutorResult, Severity};
pub use executor::{QueryExecutor, DEFAULT_MAX_RESULT_ROWS};
pub use filters::PredicateFilter;
pub use result::{ExecutionResult, ResultRow};
pub use sorter::ResultSorter;
