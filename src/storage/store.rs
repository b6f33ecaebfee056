//! Directory-backed dataset store
//!
//! Layout under the data directory:
//!
//! ```text
//! <data_dir>/data/<id>.json           normalized records, one JSON array
//! <data_dir>/metadata/datasets.json   listing with kind, row count, checksum
//! ```
//!
//! Records are validated against the field catalog at ingestion, so the
//! query path never sees an unknown field or a wrongly-typed value. Data
//! files are written to a temporary path and renamed into place.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{DatasetKind, FieldCatalog, FieldKind};

use super::checksum::{compute_checksum, verify_dataset};
use super::errors::{StoreError, StoreResult};
use super::record::{FieldValue, Record};
use super::source::RecordSource;

const DATA_DIR: &str = "data";
const METADATA_DIR: &str = "metadata";
const METADATA_FILE: &str = "datasets.json";

/// Public description of a stored dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub id: String,
    pub kind: DatasetKind,
    pub num_rows: usize,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DatasetEntry {
    #[serde(flatten)]
    info: DatasetInfo,
    checksum: u32,
}

/// Persistent store of ingested datasets
#[derive(Debug)]
pub struct DatasetStore {
    root: PathBuf,
    catalog: &'static FieldCatalog,
    entries: RwLock<BTreeMap<String, DatasetEntry>>,
    cache: RwLock<HashMap<String, Arc<[Record]>>>,
}

impl DatasetStore {
    /// Opens (creating if needed) a store rooted at `data_dir`
    pub fn open(data_dir: impl AsRef<Path>) -> StoreResult<Self> {
        let root = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(root.join(DATA_DIR))?;
        fs::create_dir_all(root.join(METADATA_DIR))?;

        let metadata_path = root.join(METADATA_DIR).join(METADATA_FILE);
        let entries = if metadata_path.exists() {
            let bytes = fs::read(&metadata_path)?;
            let listed: Vec<DatasetEntry> = serde_json::from_slice(&bytes)?;
            listed
                .into_iter()
                .map(|entry| (entry.info.id.clone(), entry))
                .collect()
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            root,
            catalog: FieldCatalog::global(),
            entries: RwLock::new(entries),
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Returns the store's root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ingests a dataset and returns the ids of all stored datasets.
    ///
    /// Each row must be a JSON object whose keys are bare field names or
    /// `<id>_<field>`; every field must exist in the catalog for `kind`
    /// with a value of the matching kind.
    pub fn add_dataset(
        &self,
        id: &str,
        kind: DatasetKind,
        rows: &[Value],
    ) -> StoreResult<Vec<String>> {
        validate_id(id)?;

        let records = rows
            .iter()
            .map(|row| {
                let record = Record::from_json(row, id)?;
                self.validate_record(kind, &record)?;
                Ok(record)
            })
            .collect::<StoreResult<Vec<_>>>()?;
        if records.is_empty() {
            return Err(StoreError::InvalidRecord(format!(
                "dataset '{}' contains no records",
                id
            )));
        }

        let bytes = serde_json::to_vec(&records)?;
        let entry = DatasetEntry {
            info: DatasetInfo {
                id: id.to_string(),
                kind,
                num_rows: records.len(),
                added_at: Utc::now(),
            },
            checksum: compute_checksum(&bytes),
        };

        // The listing lock is held from the duplicate check until the
        // metadata is on disk, so a data file is only ever written by the
        // add that owns its id.
        let ids = {
            let mut entries = self.write_entries();
            if entries.contains_key(id) {
                return Err(StoreError::AlreadyExists(id.to_string()));
            }

            let path = self.data_path(id);
            write_atomically(&path, &bytes)?;
            entries.insert(id.to_string(), entry);
            if let Err(e) = self.persist_metadata(&entries) {
                entries.remove(id);
                let _ = fs::remove_file(&path);
                return Err(e);
            }
            entries.keys().cloned().collect()
        };

        self.write_cache().insert(id.to_string(), records.into());
        Ok(ids)
    }

    /// Removes a dataset and returns its id
    pub fn remove_dataset(&self, id: &str) -> StoreResult<String> {
        validate_id(id)?;

        {
            let mut entries = self.write_entries();
            if entries.remove(id).is_none() {
                return Err(StoreError::NotFound(id.to_string()));
            }
            self.persist_metadata(&entries)?;
        }
        self.write_cache().remove(id);

        match fs::remove_file(self.data_path(id)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(id.to_string())
    }

    /// Lists stored datasets in id order
    pub fn list_datasets(&self) -> Vec<DatasetInfo> {
        self.read_entries()
            .values()
            .map(|entry| entry.info.clone())
            .collect()
    }

    /// Loads a dataset's records, verifying the checksum on first load
    pub fn load(&self, id: &str) -> StoreResult<Arc<[Record]>> {
        if let Some(records) = self.read_cache().get(id) {
            return Ok(Arc::clone(records));
        }

        let expected = self
            .read_entries()
            .get(id)
            .map(|entry| entry.checksum)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let bytes = fs::read(self.data_path(id))?;
        verify_dataset(id, &bytes, expected)?;
        let records: Vec<Record> = serde_json::from_slice(&bytes)?;
        let records: Arc<[Record]> = records.into();

        self.write_cache()
            .insert(id.to_string(), Arc::clone(&records));
        Ok(records)
    }

    fn validate_record(&self, kind: DatasetKind, record: &Record) -> StoreResult<()> {
        for (field, value) in record.iter() {
            let expected = self.catalog.field_kind_for(kind, field).ok_or_else(|| {
                StoreError::InvalidRecord(format!("unknown {} field '{}'", kind, field))
            })?;
            let matches = match (expected, value) {
                (FieldKind::Numeric, FieldValue::Number(_)) => true,
                (FieldKind::Textual, FieldValue::Text(_)) => true,
                _ => false,
            };
            if !matches {
                return Err(StoreError::InvalidRecord(format!(
                    "field '{}' must be {}",
                    field, expected
                )));
            }
        }
        Ok(())
    }

    fn persist_metadata(&self, entries: &BTreeMap<String, DatasetEntry>) -> StoreResult<()> {
        let listed: Vec<&DatasetEntry> = entries.values().collect();
        let bytes = serde_json::to_vec_pretty(&listed)?;
        write_atomically(&self.root.join(METADATA_DIR).join(METADATA_FILE), &bytes)
    }

    fn data_path(&self, id: &str) -> PathBuf {
        self.root.join(DATA_DIR).join(format!("{}.json", id))
    }

    fn read_entries(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, DatasetEntry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_entries(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, DatasetEntry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    fn read_cache(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<[Record]>>> {
        self.cache.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_cache(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<[Record]>>> {
        self.cache.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl RecordSource for DatasetStore {
    fn load_records(
        &self,
        dataset_id: &str,
    ) -> impl Future<Output = StoreResult<Arc<[Record]>>> + Send {
        std::future::ready(self.load(dataset_id))
    }
}

/// Dataset ids name files under the data directory, so they are limited
/// to alphanumerics and `-`. This rules out `_`, whitespace, dots and
/// path separators.
pub fn validate_id(id: &str) -> StoreResult<()> {
    if id.is_empty() || !id.chars().all(|c| c.is_alphanumeric() || c == '-') {
        return Err(StoreError::InvalidId(id.to_string()));
    }
    Ok(())
}

fn write_atomically(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
