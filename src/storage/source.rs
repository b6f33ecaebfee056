//! Record sources
//!
//! Loading a dataset's records is the only asynchronous step of the query
//! path. Everything after the load is a pure function over the records.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::record::Record;

/// Supplies the records of a dataset by id
pub trait RecordSource: Send + Sync {
    /// Loads every record of `dataset_id`.
    ///
    /// Returns `StoreError::NotFound` if no such dataset exists.
    fn load_records(
        &self,
        dataset_id: &str,
    ) -> impl Future<Output = StoreResult<Arc<[Record]>>> + Send;
}

/// In-memory record source for embedding and tests
#[derive(Debug, Default)]
pub struct MemorySource {
    datasets: RwLock<HashMap<String, Arc<[Record]>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a dataset
    pub fn insert(&self, dataset_id: impl Into<String>, records: Vec<Record>) {
        let mut datasets = self.datasets.write().unwrap_or_else(|e| e.into_inner());
        datasets.insert(dataset_id.into(), records.into());
    }

    /// Registers a dataset from raw JSON objects, normalizing prefixed keys
    pub fn insert_json(&self, dataset_id: &str, rows: &[Value]) -> StoreResult<()> {
        let records = rows
            .iter()
            .map(|row| Record::from_json(row, dataset_id))
            .collect::<StoreResult<Vec<_>>>()?;
        self.insert(dataset_id, records);
        Ok(())
    }

    /// Builder-style variant of [`MemorySource::insert`]
    pub fn with_dataset(self, dataset_id: impl Into<String>, records: Vec<Record>) -> Self {
        self.insert(dataset_id, records);
        self
    }

    fn get(&self, dataset_id: &str) -> StoreResult<Arc<[Record]>> {
        let datasets = self.datasets.read().unwrap_or_else(|e| e.into_inner());
        datasets
            .get(dataset_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(dataset_id.to_string()))
    }
}

impl RecordSource for MemorySource {
    fn load_records(
        &self,
        dataset_id: &str,
    ) -> impl Future<Output = StoreResult<Arc<[Record]>>> + Send {
        std::future::ready(self.get(dataset_id))
    }
}
