//! Query engine surface for insightdb
//!
//! Ties the compiler, the executor and a record source together.
//!
//! # Design Principles
//!
//! - Compile fully before loading any records
//! - Error codes passed through unchanged from the failing subsystem
//! - Record loading is the only await point

mod engine;
mod errors;

pub use engine::QueryEngine;
pub use errors::{EngineError, EngineResult};
