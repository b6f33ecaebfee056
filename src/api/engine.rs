//! Query orchestration
//!
//! Flow for every query:
//! 1. Compile the document (no records touched)
//! 2. Load the referenced dataset from the record source
//! 3. Execute against the loaded records
//!
//! Each query carries a generated `query_id` so its log lines can be
//! correlated. Rejections are logged and counted, never retried.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::catalog::{DatasetKind, FieldCatalog};
use crate::executor::{ExecutorError, QueryExecutor, ResultRow, DEFAULT_MAX_RESULT_ROWS};
use crate::observability::{Event, MetricsRegistry, Timer};
use crate::planner::{CompiledQuery, ExplainPlan, QueryCompiler};
use crate::storage::{DatasetInfo, DatasetStore, Record, RecordSource, StoreError};

use super::errors::{EngineError, EngineResult};

/// Embedded query engine over a record source
#[derive(Debug)]
pub struct QueryEngine<S> {
    source: Arc<S>,
    catalog: &'static FieldCatalog,
    executor: QueryExecutor,
    metrics: Arc<MetricsRegistry>,
}

impl<S: RecordSource> QueryEngine<S> {
    /// Creates an engine with the default row cap
    pub fn new(source: Arc<S>) -> Self {
        Self::with_max_rows(source, DEFAULT_MAX_RESULT_ROWS)
    }

    pub fn with_max_rows(source: Arc<S>, max_rows: usize) -> Self {
        Self {
            source,
            catalog: FieldCatalog::global(),
            executor: QueryExecutor::new(max_rows),
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn max_rows(&self) -> usize {
        self.executor.max_rows()
    }

    /// Compiles and runs a query document, returning its rows in output order
    pub async fn perform_query(&self, raw: &Value) -> EngineResult<Vec<ResultRow>> {
        let query_id = Uuid::new_v4().to_string();
        let timer = Timer::new();
        Event::QueryBegin.log(&[("query_id", query_id.as_str())]);

        match self.run(raw, &query_id).await {
            Ok(rows) => {
                self.metrics.record_query(rows.len());
                Event::QueryComplete.log(&[
                    ("query_id", query_id.as_str()),
                    ("rows", rows.len().to_string().as_str()),
                    ("elapsed_ms", timer.elapsed_ms().as_str()),
                ]);
                Ok(rows)
            }
            Err(err) => {
                self.metrics.increment_queries_rejected();
                Event::QueryRejected.log(&[
                    ("query_id", query_id.as_str()),
                    ("code", err.code()),
                    ("reason", err.message().as_str()),
                    ("elapsed_ms", timer.elapsed_ms().as_str()),
                ]);
                Err(err)
            }
        }
    }

    async fn run(&self, raw: &Value, query_id: &str) -> EngineResult<Vec<ResultRow>> {
        let query = QueryCompiler::new(self.catalog).compile(raw)?;
        Event::QueryCompiled.log(&[
            ("query_id", query_id),
            ("dataset", query.dataset_id.as_str()),
            ("grouped", if query.is_grouped() { "true" } else { "false" }),
        ]);

        let records = self
            .source
            .load_records(&query.dataset_id)
            .await
            .map_err(|err| match err {
                StoreError::NotFound(id) => EngineError::from(ExecutorError::dataset_not_found(id)),
                other => EngineError::from(other),
            })?;

        self.execute_compiled(&query, &records)
    }

    /// Describes what a query compiles to without loading records
    pub fn explain(&self, raw: &Value) -> ExplainPlan {
        let plan = match QueryCompiler::new(self.catalog).compile(raw) {
            Ok(query) => ExplainPlan::from_query(&query),
            Err(err) => ExplainPlan::from_error(&err),
        };
        Event::ExplainComplete.log(&[(
            "accepted",
            if plan.accepted { "true" } else { "false" },
        )]);
        plan
    }

    /// Evaluates an already-compiled query over `records`
    pub fn execute_compiled(&self, query: &CompiledQuery, records: &[Record]) -> EngineResult<Vec<ResultRow>> {
        Ok(self.executor.execute(query, records)?.into_rows())
    }
}

impl QueryEngine<DatasetStore> {
    /// Ingests a dataset into the backing store
    pub fn add_dataset(&self, id: &str, kind: DatasetKind, rows: &[Value]) -> EngineResult<Vec<String>> {
        let ids = self.source.add_dataset(id, kind, rows)?;
        self.metrics.increment_datasets_added();
        Event::DatasetAdded.log(&[
            ("dataset", id),
            ("kind", kind.as_str()),
            ("rows", rows.len().to_string().as_str()),
        ]);
        Ok(ids)
    }

    pub fn remove_dataset(&self, id: &str) -> EngineResult<String> {
        let removed = self.source.remove_dataset(id)?;
        self.metrics.increment_datasets_removed();
        Event::DatasetRemoved.log(&[("dataset", id)]);
        Ok(removed)
    }

    pub fn list_datasets(&self) -> Vec<DatasetInfo> {
        self.source.list_datasets()
    }
}
