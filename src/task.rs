//! Checkpoint lifecycle for a source task
//!
//! A source task embeds a [`Checkpointer`]: it resumes from the persisted
//! cursor on start, records every new cursor as it streams, and lets the
//! checkpointer decide when to persist so the re-read window after a
//! restart stays bounded by the checkpoint interval.

use crate::codec::Cursor;
use crate::config::SnapshotConfig;
use crate::error::Result;
use crate::provider::SnapshotProvider;
use crate::types::SaveOutcome;
use std::time::{Duration, Instant};
use tracing::debug;

/// How often a task persists its cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointPolicy {
    /// Minimum time between two save attempts
    pub interval: Duration,
}

impl Default for CheckpointPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

impl CheckpointPolicy {
    /// Policy with the given interval
    pub fn every(interval: Duration) -> Self {
        Self { interval }
    }

    /// Policy taken from a snapshot config
    pub fn from_config(config: &SnapshotConfig) -> Self {
        Self::every(config.checkpoint_interval())
    }
}

/// Drives get_snapshot/save/close for one source task
pub struct Checkpointer {
    provider: Box<dyn SnapshotProvider>,
    policy: CheckpointPolicy,
    /// Latest recorded cursor not yet durable
    pending: Option<Cursor>,
    /// Last cursor known to be durable
    persisted: Option<Cursor>,
    last_attempt: Option<Instant>,
}

impl Checkpointer {
    /// Create a checkpointer over `provider`
    pub fn new(provider: Box<dyn SnapshotProvider>, policy: CheckpointPolicy) -> Self {
        Self {
            provider,
            policy,
            pending: None,
            persisted: None,
            last_attempt: None,
        }
    }

    /// Cursor to resume streaming from. Empty for a fresh task.
    pub fn resume(&mut self) -> Result<Cursor> {
        let snapshot = self.provider.get_snapshot();
        let cursor = Cursor::decode(&snapshot)?;
        if !cursor.is_empty() {
            self.persisted = Some(cursor.clone());
        }
        Ok(cursor)
    }

    /// Record the task's latest cursor and checkpoint if the interval elapsed
    pub fn record(&mut self, cursor: Cursor) -> Option<SaveOutcome> {
        if cursor.is_empty() {
            return None;
        }
        // Back at the durable position: an unsaved newer cursor is stale now.
        if self.persisted.as_ref() == Some(&cursor) {
            self.pending = None;
            return None;
        }
        self.pending = Some(cursor);
        self.maybe_checkpoint()
    }

    /// Persist the pending cursor if the interval elapsed since the last attempt
    pub fn maybe_checkpoint(&mut self) -> Option<SaveOutcome> {
        if self.pending.is_none() {
            return None;
        }
        let due = self
            .last_attempt
            .map_or(true, |at| at.elapsed() >= self.policy.interval);
        if !due {
            return None;
        }
        self.checkpoint_now()
    }

    /// Persist the pending cursor now, ignoring the interval
    pub fn flush(&mut self) -> Option<SaveOutcome> {
        self.checkpoint_now()
    }

    /// Flush and release the provider
    pub fn shutdown(mut self) -> Option<SaveOutcome> {
        let outcome = self.flush();
        self.provider.close();
        outcome
    }

    /// Cursor waiting to be persisted
    pub fn pending(&self) -> Option<&Cursor> {
        self.pending.as_ref()
    }

    /// Underlying provider
    pub fn provider(&self) -> &dyn SnapshotProvider {
        self.provider.as_ref()
    }

    fn checkpoint_now(&mut self) -> Option<SaveOutcome> {
        let cursor = self.pending.take()?;
        let outcome = self.provider.save(&cursor.encode());
        self.last_attempt = Some(Instant::now());

        match outcome {
            SaveOutcome::Persisted => {
                debug!(
                    "Checkpointed {} byte cursor to {}",
                    cursor.len(),
                    self.provider.location().display()
                );
                self.persisted = Some(cursor);
            }
            SaveOutcome::Failed => self.pending = Some(cursor),
            SaveOutcome::SkippedEmpty | SaveOutcome::Rejected => {}
        }
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::failure::FailureHandler;
    use crate::provider::PostgresSnapshot;
    use crate::store::SnapshotStore;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn never_again() -> CheckpointPolicy {
        CheckpointPolicy::every(Duration::from_secs(3600))
    }

    #[test]
    fn test_resume_fresh_task() {
        let dir = tempdir().unwrap();
        let provider = PostgresSnapshot::new(dir.path().join("wal.offset"));
        let mut checkpointer = Checkpointer::new(Box::new(provider), never_again());

        assert!(checkpointer.resume().unwrap().is_empty());
    }

    #[test]
    fn test_first_record_saves_then_waits_for_interval() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.offset");
        let mut checkpointer =
            Checkpointer::new(Box::new(PostgresSnapshot::new(&path)), never_again());

        assert_eq!(
            checkpointer.record(Cursor::new(vec![1])),
            Some(SaveOutcome::Persisted)
        );
        assert_eq!(checkpointer.record(Cursor::new(vec![2])), None);
        assert_eq!(std::fs::read(&path).unwrap(), vec![1]);
        assert_eq!(checkpointer.pending(), Some(&Cursor::new(vec![2])));

        assert_eq!(checkpointer.shutdown(), Some(SaveOutcome::Persisted));
        assert_eq!(std::fs::read(&path).unwrap(), vec![2]);
    }

    #[test]
    fn test_zero_interval_saves_every_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.offset");
        let mut checkpointer = Checkpointer::new(
            Box::new(PostgresSnapshot::new(&path)),
            CheckpointPolicy::every(Duration::ZERO),
        );

        for i in 1..=3u8 {
            assert_eq!(
                checkpointer.record(Cursor::new(vec![i])),
                Some(SaveOutcome::Persisted)
            );
        }
        assert_eq!(std::fs::read(&path).unwrap(), vec![3]);
    }

    #[test]
    fn test_unchanged_and_empty_cursors_are_not_recorded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.offset");
        std::fs::write(&path, [5, 5]).unwrap();

        let mut checkpointer = Checkpointer::new(
            Box::new(PostgresSnapshot::new(&path)),
            CheckpointPolicy::every(Duration::ZERO),
        );
        assert_eq!(checkpointer.resume().unwrap(), Cursor::new(vec![5, 5]));

        assert_eq!(checkpointer.record(Cursor::new(vec![5, 5])), None);
        assert_eq!(checkpointer.record(Cursor::empty()), None);
        assert!(checkpointer.pending().is_none());
    }

    #[test]
    fn test_rewind_to_persisted_drops_pending() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.offset");
        let mut checkpointer =
            Checkpointer::new(Box::new(PostgresSnapshot::new(&path)), never_again());

        assert_eq!(
            checkpointer.record(Cursor::new(vec![1])),
            Some(SaveOutcome::Persisted)
        );
        assert_eq!(checkpointer.record(Cursor::new(vec![2])), None);

        // Consumer seeks back to the checkpointed position.
        assert_eq!(checkpointer.record(Cursor::new(vec![1])), None);
        assert!(checkpointer.pending().is_none());

        assert_eq!(checkpointer.shutdown(), None);
        assert_eq!(std::fs::read(&path).unwrap(), vec![1]);
    }

    #[test]
    fn test_failed_save_is_retried() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let path = blocker.join("wal.offset");

        let quiet: Arc<dyn FailureHandler> = Arc::new(|_: &Error| {});
        let store = SnapshotStore::new(&path).with_failure_handler(quiet);
        let mut checkpointer = Checkpointer::new(
            Box::new(PostgresSnapshot::with_store(store)),
            CheckpointPolicy::every(Duration::ZERO),
        );

        assert_eq!(
            checkpointer.record(Cursor::new(vec![9])),
            Some(SaveOutcome::Failed)
        );
        assert_eq!(checkpointer.pending(), Some(&Cursor::new(vec![9])));

        std::fs::remove_file(&blocker).unwrap();
        assert_eq!(checkpointer.maybe_checkpoint(), Some(SaveOutcome::Persisted));
        assert_eq!(std::fs::read(&path).unwrap(), vec![9]);
        assert!(checkpointer.pending().is_none());
    }

    #[test]
    fn test_policy_from_config() {
        let mut config = SnapshotConfig::new("/state");
        config.checkpoint_interval_secs = 30;
        assert_eq!(
            CheckpointPolicy::from_config(&config).interval,
            Duration::from_secs(30)
        );
        assert_eq!(CheckpointPolicy::default().interval, Duration::from_secs(5));
    }
}
