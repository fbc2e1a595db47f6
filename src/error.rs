//! Error taxonomy for `dupfind`.
//!
//! Components return [`Error`] values; only the top-level orchestrator decides
//! whether an error aborts the run or is skipped. [`Error::is_skippable`] encodes
//! that classification: a permission failure while listing a directory and any
//! failure while hashing a single file are skippable, everything else is fatal.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Errors produced by the deduplication library.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or missing configuration (missing comparator, empty root, ...)
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// `pop` was called on an empty heap
    #[error("Heap is empty")]
    EmptyHeap,

    /// `submit` was called after the pool was released
    #[error("Worker pool has been released")]
    PoolReleased,

    /// A worker thread panicked while running a task
    #[error("Worker thread panicked")]
    WorkerPanicked,

    /// Filesystem error tied to a path
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Content hash could not be computed for a file
    #[error("Failed to hash {path}: {source}")]
    Hash {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The run was cancelled through its cancellation token
    #[error("Scan cancelled")]
    Cancelled,
}

impl Error {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true when the orchestrator may log this error and carry on.
    pub fn is_skippable(&self) -> bool {
        match self {
            Error::Io { source, .. } => source.kind() == io::ErrorKind::PermissionDenied,
            Error::Hash { .. } => true,
            _ => false,
        }
    }
}
