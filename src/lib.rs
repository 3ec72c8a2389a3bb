//! # snapcursor
//!
//! Crash-safe cursor snapshots for resumable streaming source connectors.
//!
//! A source task (WAL reader, queue consumer, file tailer) records how far
//! it has read as an opaque byte cursor. This crate persists that cursor so
//! the task resumes exactly where it left off after a crash or restart.
//!
//! ## Features
//!
//! - **Opaque cursors**: bytes are stored as-is, never parsed or defaulted
//! - **Atomic saves**: temp file, fsync, rename; a crash never leaves a partial cursor
//! - **Empty-payload guard**: an empty snapshot never clobbers a valid one
//! - **Per-source providers**: PostgreSQL, MySQL, Kafka, file tailer
//! - **Non-fatal failures**: storage errors go to a failure handler, not the streaming path
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snapcursor::provider::{PostgresSnapshot, SnapshotProvider};
//!
//! let mut provider = PostgresSnapshot::new("/var/lib/connector/orders/wal.offset");
//!
//! // "" on a fresh task
//! let resume_from = provider.get_snapshot();
//!
//! // ... stream, then checkpoint
//! provider.save("AAAAARazdEg=");
//! provider.close();
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                 Source Task (external)                    │
//! │        task::Checkpointer: resume / record / flush        │
//! └───────────────────────────────────────────────────────────┘
//!                              │
//! ┌───────────────────────────────────────────────────────────┐
//! │   SnapshotProvider: get_snapshot() / save() / close()     │
//! │   Postgres │ MySQL │ Kafka │ File tail                    │
//! └───────────────────────────────────────────────────────────┘
//!          │                                  │
//! ┌──────────────────┐             ┌─────────────────────────┐
//! │   codec (base64) │             │ SnapshotStore (file)    │
//! └──────────────────┘             │ failure::report_failure │
//!                                  └─────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)] // TODO: document error variants and CLI fields

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Cursor type and base64 codec
pub mod codec;

/// Process-wide failure channel
pub mod failure;

/// File-backed snapshot storage
pub mod store;

/// Per-source snapshot providers
pub mod provider;

/// Checkpoint lifecycle glue for source tasks
pub mod task;

/// Snapshot configuration
pub mod config;

/// Progress reports
pub mod report;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use codec::Cursor;
pub use error::{Error, Result};
pub use types::*;

pub use config::{load_config, load_config_from_str, SnapshotConfig, TaskConfig};
pub use provider::{open_provider, SnapshotProvider};
pub use store::SnapshotStore;
pub use task::{CheckpointPolicy, Checkpointer};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
