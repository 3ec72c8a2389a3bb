//! File-backed snapshot store
//!
//! Provides single-cursor persistence with atomic writes.

use crate::codec::Cursor;
use crate::error::{Error, Result, StorageOp};
use crate::failure::{self, FailureHandler};
use crate::types::SaveOutcome;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Durable storage for one source task's cursor
pub struct SnapshotStore {
    /// Path to the snapshot file (empty in in-memory mode)
    path: PathBuf,
    /// Cursor held in in-memory mode
    memory: Cursor,
    /// Whether to fsync the temp file and parent directory on save
    fsync: bool,
    /// Whether the location has been touched since the last close
    open: bool,
    /// Store-local failure handler, overriding the process-wide one
    failures: Option<Arc<dyn FailureHandler>>,
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("path", &self.path)
            .field("fsync", &self.fsync)
            .field("open", &self.open)
            .finish_non_exhaustive()
    }
}

impl SnapshotStore {
    /// Create a store backed by the file at `path`.
    ///
    /// Nothing is touched on disk until the first `load` or `save`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            memory: Cursor::empty(),
            fsync: true,
            open: false,
            failures: None,
        }
    }

    /// Create an in-memory store (no file persistence)
    pub fn in_memory() -> Self {
        Self::new(PathBuf::new())
    }

    /// Enable or disable fsync on save
    #[must_use]
    pub fn with_fsync(mut self, fsync: bool) -> Self {
        self.fsync = fsync;
        self
    }

    /// Route storage failures to `handler` instead of the process-wide handler
    #[must_use]
    pub fn with_failure_handler(mut self, handler: Arc<dyn FailureHandler>) -> Self {
        self.failures = Some(handler);
        self
    }

    /// Get the snapshot file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }

    /// Whether the store has been accessed and not closed since
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Load the cursor, creating an empty location if none exists.
    ///
    /// Storage failures go to the failure handler and the empty cursor
    /// is returned.
    pub fn load(&mut self) -> Cursor {
        match self.try_load() {
            Ok(cursor) => cursor,
            Err(e) => {
                self.report(&e);
                Cursor::empty()
            }
        }
    }

    /// Load the cursor, propagating storage failures
    pub fn try_load(&mut self) -> Result<Cursor> {
        self.open = true;
        if self.is_in_memory() {
            return Ok(self.memory.clone());
        }

        match fs::read(&self.path) {
            Ok(bytes) => {
                debug!(
                    "Loaded {} byte snapshot from {}",
                    bytes.len(),
                    self.path.display()
                );
                Ok(Cursor::from(bytes))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.create_location()?;
                Ok(Cursor::empty())
            }
            Err(e) => Err(Error::storage(&self.path, StorageOp::Read, e)),
        }
    }

    /// Replace the stored cursor.
    ///
    /// An empty cursor is never written: it would clobber a valid
    /// checkpoint with nothing. Storage failures go to the failure
    /// handler and leave the previous value in place.
    pub fn save(&mut self, cursor: &Cursor) -> SaveOutcome {
        match self.try_save(cursor) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.report(&e);
                SaveOutcome::Failed
            }
        }
    }

    /// Replace the stored cursor, propagating storage failures
    pub fn try_save(&mut self, cursor: &Cursor) -> Result<SaveOutcome> {
        if cursor.is_empty() {
            debug!("Skipping empty snapshot for {}", self.path.display());
            return Ok(SaveOutcome::SkippedEmpty);
        }

        self.open = true;
        if self.is_in_memory() {
            self.memory = cursor.clone();
            return Ok(SaveOutcome::Persisted);
        }

        self.write_atomically(cursor.as_bytes())?;
        debug!(
            "Saved {} byte snapshot to {}",
            cursor.len(),
            self.path.display()
        );
        Ok(SaveOutcome::Persisted)
    }

    /// Release the store. Safe to call more than once.
    pub fn close(&mut self) {
        if self.open {
            debug!("Closing snapshot store {}", self.path.display());
            self.open = false;
        }
    }

    /// Create the parent directory and an empty snapshot file
    fn create_location(&self) -> Result<()> {
        if let Some(parent) = non_empty_parent(&self.path) {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| Error::storage(parent, StorageOp::CreateDir, e))?;
                info!("Created snapshot directory {}", parent.display());
            }
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(_) => {
                info!("Created empty snapshot file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(Error::storage(&self.path, StorageOp::CreateFile, e)),
        }
    }

    /// Write to a sibling temp file, sync it, then rename over the target
    fn write_atomically(&self, bytes: &[u8]) -> Result<()> {
        let parent = non_empty_parent(&self.path);
        if let Some(parent) = parent {
            fs::create_dir_all(parent)
                .map_err(|e| Error::storage(parent, StorageOp::CreateDir, e))?;
        }

        let temp_path = temp_path_for(&self.path);
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| Error::storage(&temp_path, StorageOp::CreateFile, e))?;

        let written = file
            .write_all(bytes)
            .map_err(|e| Error::storage(&temp_path, StorageOp::Write, e))
            .and_then(|()| {
                if self.fsync {
                    file.sync_all()
                        .map_err(|e| Error::storage(&temp_path, StorageOp::Sync, e))
                } else {
                    Ok(())
                }
            });
        drop(file);

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(Error::storage(&self.path, StorageOp::Rename, e));
        }

        if self.fsync {
            sync_dir(parent.unwrap_or_else(|| Path::new(".")));
        }
        Ok(())
    }

    pub(crate) fn report(&self, error: &Error) {
        match &self.failures {
            Some(handler) => handler.handle(error),
            None => failure::report_failure(error),
        }
    }
}

/// Path of the temp file used while replacing `path`
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

/// Make the rename durable. Some filesystems reject directory fsync;
/// the data itself is already synced at that point.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        debug!("Directory sync skipped for {}: {}", dir.display(), e);
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
