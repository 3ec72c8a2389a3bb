//! Progress reports for a control plane or an operator
//!
//! A report carries the encoded snapshot, never the raw cursor bytes.

use crate::provider::SnapshotProvider;
use crate::types::{EncodedSnapshot, SourceKind, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Snapshot status of one source task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotReport {
    /// Task id
    pub task: TaskId,

    /// Source kind
    pub kind: SourceKind,

    /// Backing file
    pub location: PathBuf,

    /// Current snapshot, base64 encoded
    pub snapshot: EncodedSnapshot,

    /// Cursor length in bytes
    pub bytes: usize,

    /// Last modification of the backing file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,

    /// When this report was taken
    pub reported_at: DateTime<Utc>,
}

impl SnapshotReport {
    /// Load the provider's current snapshot and describe it
    pub fn collect(task: impl Into<TaskId>, provider: &mut dyn SnapshotProvider) -> Self {
        let snapshot = provider.get_snapshot();
        let bytes = provider.state().cursor().map_or(0, |c| c.len());
        let location = provider.location().to_path_buf();
        let modified_at = std::fs::metadata(&location)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        Self {
            task: task.into(),
            kind: provider.kind(),
            location,
            snapshot,
            bytes,
            modified_at,
            reported_at: Utc::now(),
        }
    }

    /// Whether the task has never persisted a cursor
    pub fn is_fresh(&self) -> bool {
        self.bytes == 0
    }
}
