//! Error types for snapcursor
//!
//! This module defines the error hierarchy for the entire crate.
//! All fallible public APIs return `Result<T, Error>` where Error is defined here.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// The main error type for snapcursor
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Storage access failed ({operation}) for {}: {source}", .path.display())]
    StorageAccess {
        path: PathBuf,
        operation: StorageOp,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Encoding Errors
    // ============================================================================
    #[error("Malformed snapshot encoding: {0}")]
    Decode(#[from] base64::DecodeError),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for task '{task}': {message}")]
    InvalidTask { task: String, message: String },

    #[error("Task '{task}' not found in config")]
    TaskNotFound { task: String },

    #[error("Tasks '{first}' and '{second}' share snapshot location {}", .path.display())]
    SharedLocation {
        first: String,
        second: String,
        path: PathBuf,
    },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

/// Filesystem step that failed while touching a snapshot location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    CreateDir,
    CreateFile,
    Read,
    Write,
    Sync,
    Rename,
}

impl std::fmt::Display for StorageOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StorageOp::CreateDir => "create dir",
            StorageOp::CreateFile => "create file",
            StorageOp::Read => "read",
            StorageOp::Write => "write",
            StorageOp::Sync => "sync",
            StorageOp::Rename => "rename",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid task error
    pub fn invalid_task(task: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTask {
            task: task.into(),
            message: message.into(),
        }
    }

    /// Create a task not found error
    pub fn task_not_found(task: impl Into<String>) -> Self {
        Self::TaskNotFound { task: task.into() }
    }

    /// Create a storage access error for a location
    pub fn storage(path: impl AsRef<Path>, operation: StorageOp, source: std::io::Error) -> Self {
        Self::StorageAccess {
            path: path.as_ref().to_path_buf(),
            operation,
            source,
        }
    }

    /// Check if this error came from the backing storage
    pub fn is_storage_access(&self) -> bool {
        matches!(self, Error::StorageAccess { .. } | Error::Io(_))
    }

    /// Check if this error is a malformed snapshot encoding
    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Decode(_))
    }
}

/// Result type alias for snapcursor
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
