//! Snapshot configuration
//!
//! Describes where each source task keeps its snapshot and how often it
//! checkpoints. Loaded from YAML:
//!
//! ```yaml
//! state_dir: /var/lib/connector/state
//! fsync: true
//! checkpoint_interval_secs: 5
//! tasks:
//!   - id: orders-cdc
//!     kind: postgres
//!   - id: clicks
//!     kind: kafka
//!     path: /data/clicks.offset
//!     initial_snapshot: "AAAAAAAAAAA="
//! ```

use crate::codec;
use crate::error::{Error, Result};
use crate::provider::{open_provider, SnapshotProvider};
use crate::store::{temp_path_for, SnapshotStore};
use crate::types::{SourceKind, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Snapshot locations and checkpoint cadence for a set of source tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Directory under which task snapshots live by default
    pub state_dir: PathBuf,

    /// Sync snapshot files and their directory on every save
    #[serde(default = "default_fsync")]
    pub fsync: bool,

    /// Minimum time between two checkpoints of the same task
    #[serde(default = "default_checkpoint_interval_secs")]
    pub checkpoint_interval_secs: u64,

    /// Source tasks
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
}

fn default_fsync() -> bool {
    true
}

fn default_checkpoint_interval_secs() -> u64 {
    5
}

// ============================================================================
// Task Config
// ============================================================================

/// One source task's snapshot settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Unique task id
    pub id: TaskId,

    /// Source kind
    pub kind: SourceKind,

    /// Snapshot file; relative paths resolve against `state_dir`
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Encoded cursor to start from before anything is saved
    #[serde(default)]
    pub initial_snapshot: Option<String>,
}

impl TaskConfig {
    /// Resolve the snapshot file for this task
    pub fn location(&self, state_dir: &Path) -> PathBuf {
        match &self.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => state_dir.join(path),
            None => state_dir.join(&self.id).join(self.kind.default_file_name()),
        }
    }
}

impl SnapshotConfig {
    /// Create a config with defaults and no tasks
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
            fsync: default_fsync(),
            checkpoint_interval_secs: default_checkpoint_interval_secs(),
            tasks: Vec::new(),
        }
    }

    /// Add a task
    #[must_use]
    pub fn with_task(mut self, id: impl Into<TaskId>, kind: SourceKind) -> Self {
        self.tasks.push(TaskConfig {
            id: id.into(),
            kind,
            path: None,
            initial_snapshot: None,
        });
        self
    }

    /// Checkpoint interval as a duration
    pub fn checkpoint_interval(&self) -> Duration {
        Duration::from_secs(self.checkpoint_interval_secs)
    }

    /// Look up a task by id
    pub fn task(&self, id: &str) -> Result<&TaskConfig> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::task_not_found(id))
    }

    /// Snapshot file of a task
    pub fn location(&self, task: &TaskConfig) -> PathBuf {
        task.location(&self.state_dir)
    }

    /// Build the store for a task
    pub fn store_for(&self, task: &TaskConfig) -> SnapshotStore {
        SnapshotStore::new(self.location(task)).with_fsync(self.fsync)
    }

    /// Build the provider for a task
    pub fn open_provider(&self, id: &str) -> Result<Box<dyn SnapshotProvider>> {
        let task = self.task(id)?;
        open_provider(
            task.kind,
            self.store_for(task),
            task.initial_snapshot.as_deref(),
        )
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.state_dir.as_os_str().is_empty() {
            return Err(Error::config("state_dir cannot be empty"));
        }

        if self.checkpoint_interval_secs == 0 {
            return Err(Error::config("checkpoint_interval_secs must be positive"));
        }

        let mut ids = HashSet::new();
        let mut locations: Vec<(&str, PathBuf)> = Vec::with_capacity(self.tasks.len());

        for task in &self.tasks {
            validate_task(task)?;

            if !ids.insert(task.id.as_str()) {
                return Err(Error::config(format!("Duplicate task id: {}", task.id)));
            }

            let location = normalize_path(&self.location(task));
            for (first, other) in &locations {
                if let Some(path) = overlap(other, &location) {
                    return Err(Error::SharedLocation {
                        first: (*first).to_string(),
                        second: task.id.clone(),
                        path,
                    });
                }
            }
            locations.push((task.id.as_str(), location));
        }

        Ok(())
    }
}

/// Path two snapshot locations would both write to, if any.
///
/// Besides the file itself a save touches `<file>.tmp`, and the parent
/// directories must stay directories.
fn overlap(a: &Path, b: &Path) -> Option<PathBuf> {
    if a.starts_with(b) {
        return Some(b.to_path_buf());
    }
    if b.starts_with(a) {
        return Some(a.to_path_buf());
    }
    let temp_a = temp_path_for(a);
    if temp_a.as_path() == b {
        return Some(temp_a);
    }
    let temp_b = temp_path_for(b);
    if temp_b.as_path() == a {
        return Some(temp_b);
    }
    None
}

/// Resolve `.` and `..` lexically, without touching the filesystem
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Validate a single task
fn validate_task(task: &TaskConfig) -> Result<()> {
    if task.id.trim().is_empty() {
        return Err(Error::config("Task id cannot be empty"));
    }

    // The id names a directory when no explicit path is given.
    if task.path.is_none()
        && (task.id.contains('/') || task.id.contains('\\') || task.id == "." || task.id == "..")
    {
        return Err(Error::invalid_task(
            &task.id,
            "id must be usable as a directory name (or set an explicit path)",
        ));
    }

    if let Some(path) = &task.path {
        if path.as_os_str().is_empty() || path.file_name().is_none() {
            return Err(Error::invalid_task(&task.id, "path must name a file"));
        }
    }

    if let Some(initial) = &task.initial_snapshot {
        if !task.kind.accepts_initial_snapshot() {
            return Err(Error::invalid_task(
                &task.id,
                format!("{} sources do not take an initial snapshot", task.kind),
            ));
        }
        codec::decode(initial).map_err(|e| {
            Error::invalid_task(&task.id, format!("initial_snapshot is not valid: {e}"))
        })?;
    }

    Ok(())
}

// ============================================================================
// Loading
// ============================================================================

/// Load and validate a config file
pub fn load_config(path: impl AsRef<Path>) -> Result<SnapshotConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    load_config_from_str(&content)
}

/// Load and validate a config from a YAML string
pub fn load_config_from_str(yaml: &str) -> Result<SnapshotConfig> {
    let config: SnapshotConfig = serde_yaml::from_str(yaml)?;
    config.validate()?;
    Ok(config)
}
