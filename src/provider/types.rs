//! Provider types and traits
//!
//! Defines the snapshot capability set and the shared base every
//! source variant delegates to.

use crate::codec::{is_empty_payload, Cursor};
use crate::store::SnapshotStore;
use crate::types::{EncodedSnapshot, SaveOutcome, SourceKind};
use std::path::Path;
use tracing::{debug, warn};

/// In-memory view of the task's cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProviderState {
    /// Nothing loaded yet
    #[default]
    Uninitialized,
    /// Cursor cached from the last load or save
    Loaded(Cursor),
}

impl ProviderState {
    /// Cached cursor, if any
    pub fn cursor(&self) -> Option<&Cursor> {
        match self {
            ProviderState::Uninitialized => None,
            ProviderState::Loaded(cursor) => Some(cursor),
        }
    }

    /// Check if a cursor has been loaded
    pub fn is_loaded(&self) -> bool {
        matches!(self, ProviderState::Loaded(_))
    }
}

/// Shared snapshot logic over one store
#[derive(Debug)]
pub struct SnapshotBase {
    store: SnapshotStore,
    state: ProviderState,
    /// Returned while the store holds no cursor yet
    initial: Option<Cursor>,
}

impl SnapshotBase {
    /// Create a base over `store`
    pub fn new(store: SnapshotStore) -> Self {
        Self {
            store,
            state: ProviderState::Uninitialized,
            initial: None,
        }
    }

    /// Cursor to resume from while nothing has been persisted.
    ///
    /// It is not written to the store; the task's first save does that.
    #[must_use]
    pub fn with_initial(mut self, initial: Cursor) -> Self {
        self.initial = Some(initial).filter(|c| !c.is_empty());
        self
    }

    /// Get the underlying store
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Get the provider state
    pub fn state(&self) -> &ProviderState {
        &self.state
    }

    /// Get the configured initial cursor
    pub fn initial(&self) -> Option<&Cursor> {
        self.initial.as_ref()
    }

    /// Load the current cursor from the store.
    ///
    /// When the store cannot be read the failure is reported and the
    /// last cached cursor is used, or the empty cursor if none is cached.
    pub fn load(&mut self) -> Cursor {
        let stored = match self.store.try_load() {
            Ok(cursor) => cursor,
            Err(e) => {
                self.store.report(&e);
                if let ProviderState::Loaded(cached) = &self.state {
                    warn!(
                        "Resuming {} from cached snapshot after load failure",
                        self.store.path().display()
                    );
                    return cached.clone();
                }
                Cursor::empty()
            }
        };

        let cursor = match (&self.initial, stored.is_empty()) {
            (Some(initial), true) => initial.clone(),
            _ => stored,
        };
        self.state = ProviderState::Loaded(cursor.clone());
        cursor
    }

    /// Load and encode the current cursor
    pub fn get_snapshot(&mut self) -> EncodedSnapshot {
        self.load().encode()
    }

    /// Decode and persist an encoded snapshot
    pub fn save(&mut self, snapshot: &str) -> SaveOutcome {
        if is_empty_payload(snapshot) {
            debug!(
                "Ignoring empty snapshot for {}",
                self.store.path().display()
            );
            return SaveOutcome::SkippedEmpty;
        }

        let cursor = match Cursor::decode(snapshot) {
            Ok(cursor) => cursor,
            Err(e) => {
                warn!(
                    "Dropping undecodable snapshot for {}: {}",
                    self.store.path().display(),
                    e
                );
                return SaveOutcome::Rejected;
            }
        };

        self.save_cursor(cursor)
    }

    /// Persist a raw cursor
    pub fn save_cursor(&mut self, cursor: Cursor) -> SaveOutcome {
        let outcome = self.store.save(&cursor);
        if matches!(outcome, SaveOutcome::Persisted | SaveOutcome::Failed) {
            // On failure the task keeps streaming from this cursor; the
            // next save retries persisting it.
            self.state = ProviderState::Loaded(cursor);
        }
        outcome
    }

    /// Release the store
    pub fn close(&mut self) {
        self.store.close();
    }
}

/// Snapshot capability set handed to a source task.
///
/// Implementors supply the kind and access to their [`SnapshotBase`];
/// the operations themselves are shared.
pub trait SnapshotProvider: Send {
    /// Source kind this provider serves
    fn kind(&self) -> SourceKind;

    /// Shared snapshot state
    fn base(&self) -> &SnapshotBase;

    /// Mutable shared snapshot state
    fn base_mut(&mut self) -> &mut SnapshotBase;

    /// Current cursor, base64 encoded. Empty text for a fresh task.
    fn get_snapshot(&mut self) -> EncodedSnapshot {
        self.base_mut().get_snapshot()
    }

    /// Persist an encoded cursor. Empty or malformed payloads are dropped.
    fn save(&mut self, snapshot: &str) -> SaveOutcome {
        self.base_mut().save(snapshot)
    }

    /// Release held resources
    fn close(&mut self) {
        self.base_mut().close();
    }

    /// In-memory state
    fn state(&self) -> &ProviderState {
        self.base().state()
    }

    /// Backing location
    fn location(&self) -> &Path {
        self.base().store().path()
    }
}
