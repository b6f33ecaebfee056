//! Field catalog subsystem for insightdb
//!
//! Static, process-wide registry of which field names exist for each dataset
//! kind and whether each field is numeric or textual.
//!
//! # Design Principles
//!
//! - Read-only after startup
//! - Exact field-name matching, no prefixes or partial matches
//! - Kind-agnostic lookup for query keys, kind-specific lookup for records

mod registry;
mod types;

pub use registry::FieldCatalog;
pub use types::{DatasetKind, FieldDef, FieldKind};
