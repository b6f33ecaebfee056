//! Query executor for insightdb
//!
//! Execution flow (strict order):
//! 1. Filter records with the compiled WHERE tree
//! 2. Group and aggregate (if TRANSFORMATIONS present)
//! 3. Project to the selected columns
//! 4. Check the row cap on the terminal row set
//! 5. Sort (if ORDER present)
//!
//! Execution is a pure function of the compiled query and the records.

use crate::planner::{CompiledQuery, Key};
use crate::storage::Record;

use super::aggregate::Aggregator;
use super::errors::{ExecutorError, ExecutorResult};
use super::filters::PredicateFilter;
use super::result::{ExecutionResult, ResultRow};
use super::sorter::ResultSorter;

/// Default cap on the number of rows a query may return
pub const DEFAULT_MAX_RESULT_ROWS: usize = 5000;

/// Runs compiled queries over in-memory records
#[derive(Debug, Clone, Copy)]
pub struct QueryExecutor {
    max_rows: usize,
}

impl QueryExecutor {
    /// Creates an executor with the given row cap
    pub fn new(max_rows: usize) -> Self {
        Self { max_rows }
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// Executes a compiled query.
    ///
    /// Same query and same records always produce the same rows in the
    /// same order.
    pub fn execute(&self, query: &CompiledQuery, records: &[Record]) -> ExecutorResult<ExecutionResult> {
        let matched: Vec<&Record> = records
            .iter()
            .filter(|r| PredicateFilter::matches(r, &query.filter))
            .collect();
        let matched_count = matched.len();

        let mut rows: Vec<ResultRow> = match &query.transformations {
            Some(t) => {
                let names = query.options.column_names();
                Aggregator::aggregate(&matched, t)?
                    .iter()
                    .map(|row| row.project(&names))
                    .collect()
            }
            None => matched
                .iter()
                .map(|record| Self::project_record(record, &query.options.columns))
                .collect(),
        };

        if rows.len() > self.max_rows {
            return Err(ExecutorError::result_too_large(rows.len(), self.max_rows));
        }

        if let Some(sort) = &query.options.sort {
            ResultSorter::sort(&mut rows, sort);
        }

        Ok(ExecutionResult {
            rows,
            scanned_count: records.len(),
            matched_count,
            grouped: query.is_grouped(),
        })
    }

    fn project_record(record: &Record, columns: &[Key]) -> ResultRow {
        let mut row = ResultRow::new();
        for column in columns {
            if let Some(key) = column.as_field() {
                if let Some(value) = record.get(key.field()) {
                    row.push(key.qualified(), value.clone());
                }
            }
        }
        row
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESULT_ROWS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FieldCatalog;
    use crate::executor::ExecutorErrorCode;
    use crate::planner::QueryCompiler;
    use crate::storage::FieldValue;
    use serde_json::{json, Value};

    fn compile(raw: Value) -> CompiledQuery {
        QueryCompiler::new(FieldCatalog::global()).compile(&raw).unwrap()
    }

    fn rooms() -> Vec<Record> {
        vec![
            Record::new()
                .with("shortname", "DMP")
                .with("fullname", "Daniel Mackenzie")
                .with("seats", 60.0),
            Record::new()
                .with("shortname", "ANGU")
                .with("fullname", "Henry Angus")
                .with("seats", 20.0),
        ]
    }

    #[test]
    fn test_filter_and_project() {
        let query = compile(json!({
            "WHERE": {"GT": {"rooms_seats": 50}},
            "OPTIONS": {"COLUMNS": ["rooms_shortname", "rooms_seats"]}
        }));

        let result = QueryExecutor::default().execute(&query, &rooms()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.scanned_count, 2);
        assert_eq!(result.matched_count, 1);
        assert_eq!(
            serde_json::to_value(&result.rows[0]).unwrap(),
            json!({"rooms_shortname": "DMP", "rooms_seats": 60})
        );
    }

    #[test]
    fn test_sort_applied() {
        let query = compile(json!({
            "WHERE": {},
            "OPTIONS": {"COLUMNS": ["rooms_shortname", "rooms_seats"], "ORDER": "rooms_seats"}
        }));

        let result = QueryExecutor::default().execute(&query, &rooms()).unwrap();
        let names: Vec<_> = result
            .iter()
            .map(|r| r.get("rooms_shortname").cloned())
            .collect();
        assert_eq!(
            names,
            vec![Some(FieldValue::from("ANGU")), Some(FieldValue::from("DMP"))]
        );
    }

    #[test]
    fn test_grouped_projection_keeps_column_order() {
        let query = compile(json!({
            "WHERE": {},
            "OPTIONS": {"COLUMNS": ["maxSeats", "rooms_shortname"]},
            "TRANSFORMATIONS": {
                "GROUP": ["rooms_shortname"],
                "APPLY": [
                    {"maxSeats": {"MAX": "rooms_seats"}},
                    {"unused": {"COUNT": "rooms_fullname"}}
                ]
            }
        }));

        let result = QueryExecutor::default().execute(&query, &rooms()).unwrap();
        assert!(result.grouped);
        assert_eq!(result.len(), 2);
        assert_eq!(
            result.rows[0].names().collect::<Vec<_>>(),
            vec!["maxSeats", "rooms_shortname"]
        );
    }

    #[test]
    fn test_row_cap() {
        let records: Vec<Record> = (0..4).map(|i| Record::new().with("seats", i as f64)).collect();
        let query = compile(json!({
            "WHERE": {},
            "OPTIONS": {"COLUMNS": ["rooms_seats"]}
        }));

        assert!(QueryExecutor::new(4).execute(&query, &records).is_ok());

        let err = QueryExecutor::new(3).execute(&query, &records).unwrap_err();
        assert_eq!(err.code(), ExecutorErrorCode::InsightResultTooLarge);
    }

    #[test]
    fn test_row_cap_counts_groups_not_records() {
        let records: Vec<Record> = (0..10)
            .map(|i| Record::new().with("shortname", if i % 2 == 0 { "A" } else { "B" }))
            .collect();
        let query = compile(json!({
            "WHERE": {},
            "OPTIONS": {"COLUMNS": ["rooms_shortname"]},
            "TRANSFORMATIONS": {"GROUP": ["rooms_shortname"], "APPLY": []}
        }));

        let result = QueryExecutor::new(2).execute(&query, &records).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.matched_count, 10);
    }
}
