//! # insightdb HTTP Server Module
//!
//! REST surface over the query engine.
//!
//! # Endpoints
//!
//! - `PUT /dataset/:id/:kind` - Add a dataset
//! - `DELETE /dataset/:id` - Remove a dataset
//! - `GET /datasets` - List datasets
//! - `POST /query` - Run a query
//! - `GET /metrics` - Engine counters
//! - `GET /health` - Health check

pub mod config;
pub mod routes;
pub mod server;

pub use config::HttpServerConfig;
pub use routes::{api_routes, AppState};
pub use server::HttpServer;
