//! insightdb - an embedded JSON query engine
//!
//! Compiles declarative JSON queries (filter, projection, ordering,
//! grouping with aggregation) against course and room datasets and
//! evaluates them over in-memory records.
//!
//! ```ignore
//! use std::sync::Arc;
//! use insightdb::api::QueryEngine;
//! use insightdb::storage::DatasetStore;
//!
//! let engine = QueryEngine::new(Arc::new(DatasetStore::open("./data")?));
//! let rows = engine.perform_query(&query).await?;
//! ```

pub mod api;
pub mod catalog;
pub mod cli;
pub mod executor;
pub mod http_server;
pub mod observability;
pub mod planner;
pub mod storage;
