//! Error types for watch operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from watch operations.
#[derive(Error, Debug)]
pub enum WatchError {
    /// Initial stat of a path failed while building its entry.
    #[error("Path unavailable {path}: {source}")]
    PathUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Re-stat of an attached path failed during a check.
    #[error("Failed to stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An entry reported a change but nothing is listening any more.
    #[error("No observer bound for change on {path}")]
    ObserverDetached { path: PathBuf },

    #[error("Watch set is not listening")]
    NotListening,

    #[error("Watch set is already listening")]
    AlreadyListening,

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl WatchError {
    /// Whether the run loop must stop on this error
    pub fn is_fatal(&self) -> bool {
        !matches!(self, WatchError::Stat { .. })
    }
}

/// Result type for watch operations
pub type Result<T> = std::result::Result<T, WatchError>;
