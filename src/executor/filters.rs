//! Predicate evaluation
//!
//! A record missing the referenced field, or holding a value of the other
//! kind, never matches a comparison. NOT inverts whatever its child says.

use crate::planner::Filter;
use crate::storage::Record;

/// Evaluates compiled filters against records
pub struct PredicateFilter;

impl PredicateFilter {
    /// Checks if a record satisfies a filter tree
    pub fn matches(record: &Record, filter: &Filter) -> bool {
        match filter {
            Filter::All => true,
            Filter::And(children) => children.iter().all(|f| Self::matches(record, f)),
            Filter::Or(children) => children.iter().any(|f| Self::matches(record, f)),
            Filter::Not(child) => !Self::matches(record, child),
            Filter::Compare { op, key, value } => record
                .number(key.field())
                .map_or(false, |actual| op.apply(actual, *value)),
            Filter::Is { key, pattern } => record
                .text(key.field())
                .map_or(false, |actual| pattern.matches(actual)),
        }
    }
}
