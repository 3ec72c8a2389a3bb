//! CLI module
//!
//! Command-line interface for inspecting snapshots.
//!
//! # Commands
//!
//! - `show` - Print a task's encoded snapshot
//! - `save` - Persist an encoded snapshot
//! - `status` - Report all configured tasks
//! - `inspect` - Decode a snapshot to hex
//! - `validate` - Check the configuration file

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
