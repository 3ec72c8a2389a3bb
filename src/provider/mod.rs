//! Source snapshot provider module
//!
//! One provider per source kind, all exposing the same three operations
//! to the owning source task: `get_snapshot`, `save`, `close`.
//!
//! # Overview
//!
//! The provider module provides:
//! - `SnapshotProvider` - The capability set a source task talks to
//! - `SnapshotBase` - Shared load/save logic over a `SnapshotStore`
//! - `PostgresSnapshot`, `MysqlSnapshot`, `KafkaSnapshot`, `FileTailSnapshot`
//! - `open_provider` - Build the right variant for a `SourceKind`
//!
//! Snapshots cross this boundary as standard base64 text. An empty or
//! undecodable payload is never persisted.

mod sources;
mod types;

pub use sources::{
    open_provider, FileTailSnapshot, KafkaSnapshot, MysqlSnapshot, PostgresSnapshot,
};
pub use types::{ProviderState, SnapshotBase, SnapshotProvider};
