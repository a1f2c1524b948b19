//! Commit/Reconciliation Engine
//!
//! Projects every pending store record onto physical storage, one file at a
//! time. Deletions are idempotent, writes create parent directories, and
//! permission modes are applied as a diff against the on-disk mode. No
//! file's commit rolls back due to another file's failure; the batch result
//! reports per-record outcomes.

use crate::error::CommitError;
use crate::store::{FileRecord, FileStat, Store};
use crate::types::FileState;
use crate::Editor;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};

/// What commit did for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitAction {
    /// Contents written to disk; `mode_changed` reports whether a chmod was
    /// needed.
    Written { mode_changed: bool },
    /// Tombstone applied; the file is gone (or already was).
    Removed,
}

/// Per-record commit result.
#[derive(Debug)]
pub struct CommitOutcome {
    pub path: PathBuf,
    pub result: Result<CommitAction, CommitError>,
}

/// Batch commit result. Failures never abort the batch.
#[derive(Debug, Default)]
pub struct CommitReport {
    pub outcomes: Vec<CommitOutcome>,
}

impl CommitReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &CommitOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn written(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, Ok(CommitAction::Written { .. })))
            .count()
    }

    pub fn removed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, Ok(CommitAction::Removed)))
            .count()
    }
}

impl<S: Store> Editor<S> {
    /// Flush every pending record to disk.
    ///
    /// Successfully committed records reset to `Unmodified` with their stat
    /// refreshed from disk, so an immediate re-commit is a no-op. Failed
    /// records keep their pending state and appear in the report.
    pub fn commit(&self) -> CommitReport {
        let mut pending: Vec<FileRecord> = Vec::new();
        self.store.each(&mut |record| {
            if record.state != FileState::Unmodified {
                pending.push(record.clone());
            }
        });

        let mut report = CommitReport::default();
        for mut record in pending {
            let path = record.path.clone();
            let result = match record.state {
                FileState::Deleted => self.commit_removal(&record),
                FileState::Modified => self.commit_write(&mut record),
                FileState::Unmodified => continue,
            };
            match &result {
                Ok(action) => {
                    debug!(path = %path.display(), ?action, "committed");
                    record.state = FileState::Unmodified;
                    self.stage(record);
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "commit failed");
                }
            }
            report.outcomes.push(CommitOutcome { path, result });
        }
        report
    }

    fn commit_removal(&self, record: &FileRecord) -> Result<CommitAction, CommitError> {
        match fs::remove_file(&record.path) {
            Ok(()) => Ok(CommitAction::Removed),
            // Absence is success, not failure.
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(CommitAction::Removed),
            Err(source) => Err(CommitError::Remove {
                path: record.path.clone(),
                source,
            }),
        }
    }

    fn commit_write(&self, record: &mut FileRecord) -> Result<CommitAction, CommitError> {
        if let Some(parent) = record.path.parent() {
            fs::create_dir_all(parent).map_err(|source| CommitError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let contents = record.contents.as_deref().unwrap_or_default();
        fs::write(&record.path, contents).map_err(|source| CommitError::Write {
            path: record.path.clone(),
            source,
        })?;

        let mode_changed = self.apply_mode(record)?;

        let metadata = fs::metadata(&record.path).map_err(|source| CommitError::Stat {
            path: record.path.clone(),
            source,
        })?;
        record.stat = Some(FileStat::from_metadata(&metadata));
        Ok(CommitAction::Written { mode_changed })
    }

    /// Diff the record's mode against disk and chmod only on difference, so
    /// repeated commits of an unchanged mode perform no mode-change
    /// syscalls.
    #[cfg(unix)]
    fn apply_mode(&self, record: &FileRecord) -> Result<bool, CommitError> {
        use std::os::unix::fs::PermissionsExt;

        let desired = match record.stat.as_ref().and_then(|s| s.mode) {
            Some(mode) => mode & 0o7777,
            None => return Ok(false),
        };
        let metadata = fs::metadata(&record.path).map_err(|source| CommitError::Stat {
            path: record.path.clone(),
            source,
        })?;
        let current = metadata.permissions().mode() & 0o7777;
        if current == desired {
            return Ok(false);
        }
        fs::set_permissions(&record.path, fs::Permissions::from_mode(desired)).map_err(
            |source| CommitError::Chmod {
                path: record.path.clone(),
                source,
            },
        )?;
        Ok(true)
    }

    #[cfg(not(unix))]
    fn apply_mode(&self, _record: &FileRecord) -> Result<bool, CommitError> {
        Ok(false)
    }
}
