//! Common types used throughout snapcursor
//!
//! This module contains shared type definitions and type aliases
//! used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// Transport-safe text form of a cursor (standard base64)
pub type EncodedSnapshot = String;

/// Identifier of a source task instance
pub type TaskId = String;

// ============================================================================
// Save Outcome
// ============================================================================

/// What happened to a snapshot handed to `save`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    /// The new cursor is durable
    Persisted,
    /// Empty payload, nothing written
    SkippedEmpty,
    /// Payload could not be decoded, nothing written
    Rejected,
    /// Storage failed; the previous value is still in place
    Failed,
}

impl SaveOutcome {
    /// Whether the caller has nothing left to retry
    pub fn is_settled(&self) -> bool {
        !matches!(self, SaveOutcome::Failed)
    }
}

// ============================================================================
// Source Kind
// ============================================================================

/// Kind of streaming source a snapshot belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// PostgreSQL logical replication (WAL LSN)
    Postgres,
    /// MySQL binlog reader (file/position or GTID set)
    Mysql,
    /// Kafka consumer (partition offsets)
    Kafka,
    /// Local file tailer (file identity and byte offset)
    File,
}

impl SourceKind {
    /// All supported kinds
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Postgres,
        SourceKind::Mysql,
        SourceKind::Kafka,
        SourceKind::File,
    ];

    /// Name used in config files and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Postgres => "postgres",
            SourceKind::Mysql => "mysql",
            SourceKind::Kafka => "kafka",
            SourceKind::File => "file",
        }
    }

    /// File name of the snapshot when a task does not configure a path
    pub fn default_file_name(&self) -> &'static str {
        match self {
            SourceKind::Postgres => "wal.offset",
            SourceKind::Mysql => "binlog.offset",
            SourceKind::Kafka => "consumer.offset",
            SourceKind::File => "tail.offset",
        }
    }

    /// Whether the kind accepts a configured initial snapshot.
    ///
    /// Database log readers always start fresh from what the server
    /// reports (replication slot, binlog head), so they take none.
    pub fn accepts_initial_snapshot(&self) -> bool {
        matches!(self, SourceKind::Kafka | SourceKind::File)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for SourceKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(SourceKind::Postgres),
            "mysql" | "mariadb" => Ok(SourceKind::Mysql),
            "kafka" => Ok(SourceKind::Kafka),
            "file" => Ok(SourceKind::File),
            other => Err(crate::Error::config(format!("Unknown source kind: {other}"))),
        }
    }
}
