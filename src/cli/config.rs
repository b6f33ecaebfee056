//! Configuration file
//!
//! ```json
//! {
//!   "data_dir": "./data",
//!   "max_result_rows": 5000,
//!   "server": {"host": "0.0.0.0", "port": 4321, "cors_origins": []}
//! }
//! ```
//!
//! Only `data_dir` is required.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::executor::DEFAULT_MAX_RESULT_ROWS;
use crate::http_server::HttpServerConfig;

use super::errors::{CliError, CliResult};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Row cap per query (optional, default 5000)
    #[serde(default = "default_max_result_rows")]
    pub max_result_rows: usize,

    #[serde(default)]
    pub server: HttpServerConfig,
}

fn default_max_result_rows() -> usize {
    DEFAULT_MAX_RESULT_ROWS
}

impl Config {
    /// Load and validate configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config {}: {}", path.display(), e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        if self.max_result_rows == 0 {
            return Err(CliError::config_error("max_result_rows must be > 0"));
        }

        Ok(())
    }

    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }
}
