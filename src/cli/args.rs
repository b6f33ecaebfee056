//! CLI argument definitions using clap
//!
//! Commands:
//! - insightdb serve --config <path> [--port <port>]
//! - insightdb query --config <path> [--file <query.json>]
//! - insightdb explain --config <path> [--file <query.json>]
//! - insightdb datasets --config <path>
//! - insightdb add --config <path> --id <id> --kind <kind> --file <records.json>
//! - insightdb remove --config <path> --id <id>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// insightdb - an embedded JSON query engine over course and room datasets
#[derive(Parser, Debug)]
#[command(name = "insightdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./insightdb.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Execute a single query and exit
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./insightdb.json")]
        config: PathBuf,

        /// Query document; read from stdin if absent
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Show how a query compiles, without running it
    Explain {
        /// Path to configuration file
        #[arg(long, default_value = "./insightdb.json")]
        config: PathBuf,

        /// Query document; read from stdin if absent
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// List stored datasets
    Datasets {
        /// Path to configuration file
        #[arg(long, default_value = "./insightdb.json")]
        config: PathBuf,
    },

    /// Add a dataset from a JSON array of records
    Add {
        /// Path to configuration file
        #[arg(long, default_value = "./insightdb.json")]
        config: PathBuf,

        #[arg(long)]
        id: String,

        /// `courses` or `rooms`
        #[arg(long)]
        kind: String,

        #[arg(long)]
        file: PathBuf,
    },

    /// Remove a dataset
    Remove {
        /// Path to configuration file
        #[arg(long, default_value = "./insightdb.json")]
        config: PathBuf,

        #[arg(long)]
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
