//! Tests for SnapshotStore

use super::*;
use crate::codec::Cursor;
use crate::error::Error;
use crate::failure::FailureHandler;
use crate::types::SaveOutcome;
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

/// Collects reported failures for assertions
#[derive(Default)]
struct Recorder(Mutex<Vec<String>>);

impl FailureHandler for Recorder {
    fn handle(&self, error: &Error) {
        assert!(error.is_storage_access(), "unexpected failure: {error}");
        self.0.lock().unwrap().push(error.to_string());
    }
}

impl Recorder {
    fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_store_new_touches_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pg").join("wal.offset");

    let store = SnapshotStore::new(&path);
    assert!(!store.is_in_memory());
    assert!(!store.is_open());
    assert_eq!(store.path(), path.as_path());
    assert!(!path.exists());
}

#[test]
fn test_store_in_memory() {
    let mut store = SnapshotStore::in_memory();
    assert!(store.is_in_memory());
    assert!(store.load().is_empty());

    assert_eq!(store.save(&Cursor::new(vec![9, 9])), SaveOutcome::Persisted);
    assert_eq!(store.load(), Cursor::new(vec![9, 9]));
}

#[test]
fn test_temp_path_sits_next_to_target() {
    let tmp = temp_path_for(std::path::Path::new("/state/task-1/wal.offset"));
    assert_eq!(tmp, std::path::PathBuf::from("/state/task-1/wal.offset.tmp"));
}

// ============================================================================
// Load Tests
// ============================================================================

#[test]
fn test_load_missing_creates_location() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("wal.offset");

    let mut store = SnapshotStore::new(&path);
    let cursor = store.try_load().unwrap();

    assert!(cursor.is_empty());
    assert!(path.is_file());
    assert_eq!(std::fs::read(&path).unwrap(), Vec::<u8>::new());
    assert!(store.is_open());
}

#[test]
fn test_load_existing_reads_raw_bytes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.offset");
    let bytes = vec![0x00, 0x00, 0x00, 0x01, 0x6b, 0x37, 0x48, 0xff];
    std::fs::write(&path, &bytes).unwrap();

    let mut store = SnapshotStore::new(&path);
    assert_eq!(store.load().as_bytes(), bytes.as_slice());
}

#[test]
fn test_load_failure_is_reported_not_raised() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let recorder = Arc::new(Recorder::default());
    let mut store = SnapshotStore::new(blocker.join("wal.offset"))
        .with_failure_handler(Arc::clone(&recorder) as Arc<dyn FailureHandler>);

    assert!(store.load().is_empty());
    assert_eq!(recorder.count(), 1);
}

#[test]
fn test_try_load_propagates_failure() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"x").unwrap();

    let mut store = SnapshotStore::new(blocker.join("sub").join("wal.offset"));
    let err = store.try_load().unwrap_err();
    assert!(err.is_storage_access());
}

// ============================================================================
// Save Tests
// ============================================================================

#[test]
fn test_save_then_load_is_byte_identical() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.offset");
    let cursor = Cursor::new((0..=255u8).collect::<Vec<_>>());

    let mut store = SnapshotStore::new(&path);
    assert_eq!(store.save(&cursor), SaveOutcome::Persisted);

    let mut reopened = SnapshotStore::new(&path);
    assert_eq!(reopened.load(), cursor);
    assert_eq!(std::fs::read(&path).unwrap(), cursor.as_bytes());
}

#[test]
fn test_save_replaces_not_appends() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.offset");

    let mut store = SnapshotStore::new(&path);
    store.save(&Cursor::new(b"first-longer-value".to_vec()));
    store.save(&Cursor::new(b"second".to_vec()));

    assert_eq!(std::fs::read(&path).unwrap(), b"second");
}

#[test]
fn test_save_empty_is_noop() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.offset");

    let mut store = SnapshotStore::new(&path);
    store.save(&Cursor::new(vec![1, 2, 3]));
    assert_eq!(store.save(&Cursor::empty()), SaveOutcome::SkippedEmpty);

    assert_eq!(store.load(), Cursor::new(vec![1, 2, 3]));
}

#[test]
fn test_save_before_load_creates_parent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fresh").join("wal.offset");

    let mut store = SnapshotStore::new(&path).with_fsync(false);
    assert_eq!(store.save(&Cursor::new(vec![7])), SaveOutcome::Persisted);
    assert_eq!(std::fs::read(&path).unwrap(), vec![7]);
}

#[test]
fn test_save_leaves_no_temp_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.offset");

    let mut store = SnapshotStore::new(&path);
    store.save(&Cursor::new(vec![1]));

    assert!(!temp_path_for(&path).exists());
}

#[test]
fn test_save_failure_is_reported_and_keeps_nothing_partial() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"x").unwrap();

    let recorder = Arc::new(Recorder::default());
    let mut store = SnapshotStore::new(blocker.join("wal.offset"))
        .with_failure_handler(Arc::clone(&recorder) as Arc<dyn FailureHandler>);

    assert_eq!(store.save(&Cursor::new(vec![1, 2])), SaveOutcome::Failed);
    assert_eq!(recorder.count(), 1);
    assert_eq!(std::fs::read(&blocker).unwrap(), b"x");
}

#[cfg(target_os = "linux")]
#[test]
fn test_failed_write_removes_temp_file() {
    let full = std::path::Path::new("/dev/full");
    if !full.exists() {
        return;
    }
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.offset");
    let recorder = Arc::new(Recorder::default());
    let mut store = SnapshotStore::new(&path)
        .with_failure_handler(Arc::clone(&recorder) as Arc<dyn FailureHandler>);
    store.save(&Cursor::new(b"kept".to_vec()));

    // Every write through the temp file fails with ENOSPC.
    std::os::unix::fs::symlink(full, temp_path_for(&path)).unwrap();

    assert_eq!(store.save(&Cursor::new(b"lost".to_vec())), SaveOutcome::Failed);
    assert_eq!(recorder.count(), 1);
    assert!(std::fs::symlink_metadata(temp_path_for(&path)).is_err());
    assert_eq!(std::fs::read(&path).unwrap(), b"kept");
}

// ============================================================================
// Crash Safety Tests
// ============================================================================

#[test]
fn test_crash_before_rename_keeps_old_value() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.offset");

    let mut store = SnapshotStore::new(&path);
    store.save(&Cursor::new(b"old-position".to_vec()));

    // A writer died after starting the temp file but before the rename.
    std::fs::write(temp_path_for(&path), b"new-pos").unwrap();

    let mut restarted = SnapshotStore::new(&path);
    assert_eq!(restarted.load(), Cursor::new(b"old-position".to_vec()));
}

#[test]
fn test_next_save_overwrites_stale_temp() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.offset");
    std::fs::write(temp_path_for(&path), b"garbage from a crashed writer").unwrap();

    let mut store = SnapshotStore::new(&path);
    assert!(store.load().is_empty());
    store.save(&Cursor::new(b"fresh".to_vec()));

    assert_eq!(std::fs::read(&path).unwrap(), b"fresh");
    assert!(!temp_path_for(&path).exists());
}

// ============================================================================
// Close Tests
// ============================================================================

#[test]
fn test_close_is_idempotent_and_reusable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.offset");

    let mut store = SnapshotStore::new(&path);
    store.save(&Cursor::new(vec![4, 2]));
    store.close();
    store.close();
    assert!(!store.is_open());

    assert_eq!(store.load(), Cursor::new(vec![4, 2]));
    assert!(store.is_open());
}
