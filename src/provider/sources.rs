//! Snapshot providers per source kind
//!
//! Each variant owns one store. Database log readers always start from an
//! empty cursor on a fresh task; queue consumers and file tailers may be
//! given an initial cursor to start from instead.

use super::types::{SnapshotBase, SnapshotProvider};
use crate::codec::Cursor;
use crate::error::{Error, Result};
use crate::store::SnapshotStore;
use crate::types::SourceKind;
use std::path::Path;

// ============================================================================
// PostgreSQL
// ============================================================================

/// Snapshot of a PostgreSQL logical replication reader.
///
/// The cursor is whatever the reader uses to acknowledge the WAL,
/// typically the last flushed LSN. A fresh task resumes from the
/// replication slot's confirmed position.
#[derive(Debug)]
pub struct PostgresSnapshot {
    base: SnapshotBase,
}

impl PostgresSnapshot {
    /// Create a provider backed by the file at `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_store(SnapshotStore::new(path))
    }

    /// Create a provider over an existing store
    pub fn with_store(store: SnapshotStore) -> Self {
        Self {
            base: SnapshotBase::new(store),
        }
    }
}

impl SnapshotProvider for PostgresSnapshot {
    fn kind(&self) -> SourceKind {
        SourceKind::Postgres
    }

    fn base(&self) -> &SnapshotBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SnapshotBase {
        &mut self.base
    }
}

// ============================================================================
// MySQL
// ============================================================================

/// Snapshot of a MySQL/MariaDB binlog reader (binlog file and position,
/// or an executed GTID set)
#[derive(Debug)]
pub struct MysqlSnapshot {
    base: SnapshotBase,
}

impl MysqlSnapshot {
    /// Create a provider backed by the file at `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_store(SnapshotStore::new(path))
    }

    /// Create a provider over an existing store
    pub fn with_store(store: SnapshotStore) -> Self {
        Self {
            base: SnapshotBase::new(store),
        }
    }
}

impl SnapshotProvider for MysqlSnapshot {
    fn kind(&self) -> SourceKind {
        SourceKind::Mysql
    }

    fn base(&self) -> &SnapshotBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SnapshotBase {
        &mut self.base
    }
}

// ============================================================================
// Kafka
// ============================================================================

/// Snapshot of a Kafka consumer's partition offsets
#[derive(Debug)]
pub struct KafkaSnapshot {
    base: SnapshotBase,
}

impl KafkaSnapshot {
    /// Create a provider backed by the file at `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_store(SnapshotStore::new(path))
    }

    /// Create a provider over an existing store
    pub fn with_store(store: SnapshotStore) -> Self {
        Self {
            base: SnapshotBase::new(store),
        }
    }

    /// Start from `snapshot` until the consumer saves its own offsets
    pub fn with_initial_snapshot(self, snapshot: &str) -> Result<Self> {
        Ok(Self {
            base: self.base.with_initial(Cursor::decode(snapshot)?),
        })
    }
}

impl SnapshotProvider for KafkaSnapshot {
    fn kind(&self) -> SourceKind {
        SourceKind::Kafka
    }

    fn base(&self) -> &SnapshotBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SnapshotBase {
        &mut self.base
    }
}

// ============================================================================
// File Tailer
// ============================================================================

/// Snapshot of a local file tailer (file identity plus byte offset)
#[derive(Debug)]
pub struct FileTailSnapshot {
    base: SnapshotBase,
}

impl FileTailSnapshot {
    /// Create a provider backed by the file at `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_store(SnapshotStore::new(path))
    }

    /// Create a provider over an existing store
    pub fn with_store(store: SnapshotStore) -> Self {
        Self {
            base: SnapshotBase::new(store),
        }
    }

    /// Start from `snapshot` until the tailer saves its own position
    pub fn with_initial_snapshot(self, snapshot: &str) -> Result<Self> {
        Ok(Self {
            base: self.base.with_initial(Cursor::decode(snapshot)?),
        })
    }
}

impl SnapshotProvider for FileTailSnapshot {
    fn kind(&self) -> SourceKind {
        SourceKind::File
    }

    fn base(&self) -> &SnapshotBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SnapshotBase {
        &mut self.base
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Build the provider for `kind` over `store`.
///
/// `initial_snapshot` is only accepted by kinds that bootstrap from one.
pub fn open_provider(
    kind: SourceKind,
    store: SnapshotStore,
    initial_snapshot: Option<&str>,
) -> Result<Box<dyn SnapshotProvider>> {
    if initial_snapshot.is_some() && !kind.accepts_initial_snapshot() {
        return Err(Error::config(format!(
            "{kind} sources do not take an initial snapshot"
        )));
    }

    let provider: Box<dyn SnapshotProvider> = match (kind, initial_snapshot) {
        (SourceKind::Postgres, _) => Box::new(PostgresSnapshot::with_store(store)),
        (SourceKind::Mysql, _) => Box::new(MysqlSnapshot::with_store(store)),
        (SourceKind::Kafka, None) => Box::new(KafkaSnapshot::with_store(store)),
        (SourceKind::Kafka, Some(s)) => {
            Box::new(KafkaSnapshot::with_store(store).with_initial_snapshot(s)?)
        }
        (SourceKind::File, None) => Box::new(FileTailSnapshot::with_store(store)),
        (SourceKind::File, Some(s)) => {
            Box::new(FileTailSnapshot::with_store(store).with_initial_snapshot(s)?)
        }
    };
    Ok(provider)
}
