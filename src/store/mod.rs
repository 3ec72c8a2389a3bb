//! Snapshot store module
//!
//! Durable, local persistence of exactly one cursor per source task.
//!
//! # Overview
//!
//! The store module provides:
//! - `SnapshotStore` - File-backed cursor storage with atomic replacement
//! - In-memory mode for dry runs and tests
//!
//! The backing file holds the raw cursor bytes with no header, length
//! prefix or checksum. Saves go through a sibling `.tmp` file that is
//! synced and renamed over the target.

mod file;

pub use file::{temp_path_for, SnapshotStore};

#[cfg(test)]
mod tests;
