//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Inspect and manage source task snapshots
#[derive(Parser, Debug)]
#[command(name = "snapcursor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Snapshot configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a task's current snapshot
    Show {
        /// Task id
        task: String,
    },

    /// Persist an encoded snapshot for a task
    Save {
        /// Task id
        task: String,

        /// Snapshot (standard base64)
        snapshot: String,
    },

    /// Report every configured task
    Status,

    /// Decode a snapshot and print its bytes
    Inspect {
        /// Snapshot (standard base64)
        snapshot: String,
    },

    /// Validate the configuration file
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
