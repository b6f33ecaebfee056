//! CLI module for insightdb
//!
//! Provides command-line interface for:
//! - serve: Start the HTTP server
//! - query: One-shot query execution
//! - explain: One-shot compile-only explain
//! - datasets, add, remove: Dataset management

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{add, datasets, explain, query, remove, run, run_command, serve};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_input, write_error, write_response};
