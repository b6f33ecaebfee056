//! Query compiler for insightdb
//!
//! Turns a raw JSON query document into a validated `CompiledQuery`.
//!
//! # Design Principles
//!
//! - Eager: every validation happens before any record is touched
//! - Single dataset: the first field key fixes the dataset id for the query
//! - Typed filters: one enum variant per filter kind, compiled recursively
//! - Value keys: keys are compared structurally, never by identity

mod errors;
mod explain;
mod filter;
mod key;
mod options;
mod query;
mod transform;

pub use errors::{QueryError, QueryErrorCode, QueryResult, Severity};
pub use explain::ExplainPlan;
pub use filter::{ComparisonOp, Filter, Pattern};
pub use key::{FieldKey, Key, KeyResolver};
pub use options::{Options, SortDirection, SortSpec};
pub use query::{CompiledQuery, QueryCompiler};
pub use transform::{ApplyRule, ApplyToken, Transformations};
