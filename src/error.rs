//! Error taxonomy for editor operations and commit reconciliation.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by editor operations (read, write, copy, delete).
///
/// Resolution and classification errors abort a batch before any disk I/O;
/// per-file I/O errors carry the path they are attributable to.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Copy or delete resolved zero candidates and the caller did not opt out
    /// via `ignore_no_match`.
    #[error("no source matched: {patterns:?}")]
    NoMatch { patterns: Vec<String> },

    /// A multi-file copy targets an existing destination that is not a
    /// directory.
    #[error("when copying multiple files, destination must be a directory: {path}")]
    DestinationShape { path: PathBuf },

    /// Append was requested against a store that cannot distinguish loaded
    /// records from on-disk files.
    #[error("append requires a store with in-memory existence checks")]
    IncompatibleStore,

    /// Malformed input, e.g. an empty source list or an empty path string.
    #[error("invalid source specification: {0}")]
    Validation(String),

    /// The template engine rejected a path or content string.
    #[error("template rendering failed for {path}: {reason}")]
    Template { path: PathBuf, reason: String },

    /// JSON (de)serialization failure in the JSON helpers.
    #[error("JSON error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A real filesystem failure, propagated unmodified and never retried.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A malformed glob pattern.
    #[error("invalid glob pattern {pattern:?}: {reason}")]
    Pattern { pattern: String, reason: String },

    /// The caller's content processor hook failed.
    #[error("content processor failed for {path}: {reason}")]
    Process { path: PathBuf, reason: String },
}

impl EditorError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        EditorError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Per-file commit failure; always attributable to a single path.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create parent directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to update permissions on {path}: {source}")]
    Chmod {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CommitError {
    /// Path the failure is attributable to.
    pub fn path(&self) -> &Path {
        match self {
            CommitError::Remove { path, .. }
            | CommitError::CreateDir { path, .. }
            | CommitError::Write { path, .. }
            | CommitError::Chmod { path, .. }
            | CommitError::Stat { path, .. } => path,
        }
    }
}
