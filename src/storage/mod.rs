//! Dataset storage for insightdb
//!
//! Holds the normalized, immutable records that queries run against.
//!
//! # Design Principles
//!
//! - Records are keyed by bare field name; dataset prefixes are stripped at ingestion
//! - Every record is validated against the field catalog before it is stored
//! - Data files are checksum-verified on every cold read
//! - Loaded datasets are cached and shared read-only by `Arc`

mod checksum;
mod errors;
mod record;
mod source;
mod store;

pub use checksum::compute_checksum;
pub use errors::{StoreError, StoreResult};
pub use record::{FieldValue, Record};
pub use source::{MemorySource, RecordSource};
pub use store::{validate_id, DatasetInfo, DatasetStore};
