//! CLI command implementations
//!
//! Every command loads the configuration first and opens the dataset
//! store it names. One-shot commands print exactly one JSON object to
//! stdout; engine failures are reported in that object, not as CLI errors.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;

use crate::api::{EngineResult, QueryEngine};
use crate::catalog::DatasetKind;
use crate::http_server::HttpServer;
use crate::observability::{Event, Logger, Severity};
use crate::storage::DatasetStore;

use super::args::{Cli, Command};
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{read_input, write_error, write_response};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    // Only the server logs below ERROR; one-shot output stays pure JSON
    if !matches!(cmd, Command::Serve { .. }) {
        Logger::set_min_severity(Severity::Error);
    }

    match cmd {
        Command::Serve { config, port } => serve(&config, port),
        Command::Query { config, file } => query(&config, file.as_deref()),
        Command::Explain { config, file } => explain(&config, file.as_deref()),
        Command::Datasets { config } => datasets(&config),
        Command::Add {
            config,
            id,
            kind,
            file,
        } => add(&config, &id, &kind, &file),
        Command::Remove { config, id } => remove(&config, &id),
    }
}

fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    Event::ConfigLoaded.log(&[
        ("path", config_path.display().to_string().as_str()),
        ("data_dir", config.data_dir.as_str()),
    ]);
    Ok(config)
}

fn open_engine(config: &Config) -> CliResult<QueryEngine<DatasetStore>> {
    let store = DatasetStore::open(config.data_path()).map_err(|e| {
        CliError::boot_failed(format!(
            "Failed to open data directory {}: {}",
            config.data_dir, e
        ))
    })?;
    Event::DatasetsLoaded.log(&[("count", store.list_datasets().len().to_string().as_str())]);

    Ok(QueryEngine::with_max_rows(
        Arc::new(store),
        config.max_result_rows,
    ))
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))
}

fn respond(result: EngineResult<Value>) -> CliResult<()> {
    match result {
        Ok(data) => write_response(data),
        Err(err) => write_error(err.code(), &err.message()),
    }
}

/// Start the HTTP server and serve until stopped
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
    }
    let engine = open_engine(&config)?;
    let server = HttpServer::new(config.server.clone(), engine);

    runtime()?.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Execute a single query and exit
pub fn query(config_path: &Path, file: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let engine = open_engine(&config)?;
    let raw = read_input(file)?;

    match runtime()?.block_on(engine.perform_query(&raw)) {
        Ok(rows) => write_response(serde_json::to_value(rows)?),
        Err(err) => write_error(err.code(), &err.message()),
    }
}

/// Print the compiled plan of a query without running it
pub fn explain(config_path: &Path, file: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let engine = open_engine(&config)?;
    let raw = read_input(file)?;

    let plan = engine.explain(&raw);
    write_response(serde_json::to_value(plan)?)
}

/// List stored datasets
pub fn datasets(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let engine = open_engine(&config)?;
    write_response(serde_json::to_value(engine.list_datasets())?)
}

/// Add a dataset from a JSON array file
pub fn add(config_path: &Path, id: &str, kind: &str, file: &Path) -> CliResult<()> {
    let kind = DatasetKind::from_str(kind).map_err(CliError::invalid_argument)?;
    let config = load_config(config_path)?;
    let engine = open_engine(&config)?;

    let rows = match read_input(Some(file))? {
        Value::Array(rows) => rows,
        _ => {
            return Err(CliError::invalid_argument(format!(
                "{} must contain a JSON array of records",
                file.display()
            )));
        }
    };

    respond(engine.add_dataset(id, kind, &rows).map(Value::from))
}

/// Remove a dataset
pub fn remove(config_path: &Path, id: &str) -> CliResult<()> {
    let config = load_config(config_path)?;
    let engine = open_engine(&config)?;
    respond(engine.remove_dataset(id).map(Value::from))
}
