//! Delete Engine
//!
//! Tombstones store entries for later removal on commit. Literal in-store
//! targets are tombstoned directly; unknown literals and glob patterns are
//! expanded against disk and the store. Deleting an already-tombstoned path
//! is a no-op, never an error.

use crate::error::EditorError;
use crate::glob::{is_dynamic_pattern, GlobOptions};
use crate::reconcile;
use crate::source::{self, Source, SourceSpec};
use crate::store::Store;
use crate::types::FileState;
use crate::Editor;
use std::path::Path;
use tracing::debug;

/// Configuration for delete operations.
#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    /// Forwarded to glob expansion.
    pub glob: GlobOptions,
    /// Treat a pattern matching zero files as a silent no-op instead of an
    /// error.
    pub ignore_no_match: bool,
}

impl<S: Store> Editor<S> {
    /// Tombstone every file matching `paths` (literals and glob patterns).
    ///
    /// Literal paths already staged in the store are tombstoned directly;
    /// tombstoned-again paths are silently skipped. Everything else expands
    /// against disk plus the store's virtual files. A dynamic pattern
    /// matching nothing at all is a [`EditorError::NoMatch`] unless
    /// `ignore_no_match` is set.
    pub fn delete(
        &self,
        paths: impl Into<SourceSpec>,
        options: &DeleteOptions,
    ) -> Result<(), EditorError> {
        let resolved = source::resolve(&paths.into(), &self.cwd)?;

        let mut candidates: Vec<String> = Vec::new();
        let mut tombstoned = 0usize;
        for source in &resolved.sources {
            match source {
                Source::Literal(path) if self.store.exists_in_memory(path) => {
                    // Already tombstoned records are treated as not-found.
                    if self.store.get(path).has_contents() {
                        self.tombstone(path);
                        tombstoned += 1;
                    }
                }
                other => candidates.push(other.as_spec_string()),
            }
        }

        let had_pattern = candidates.iter().any(|c| is_dynamic_pattern(c));
        if !candidates.is_empty() {
            let files = reconcile::resolve_files(&candidates, &self.store, &options.glob)?;
            for file in files {
                self.tombstone(&file.path);
                tombstoned += 1;
            }
        }

        if tombstoned == 0 && had_pattern && !options.ignore_no_match {
            // Unknown literals are silent no-ops; only the patterns that
            // matched nothing are worth reporting.
            return Err(EditorError::NoMatch {
                patterns: candidates
                    .into_iter()
                    .filter(|c| is_dynamic_pattern(c))
                    .collect(),
            });
        }
        Ok(())
    }

    fn tombstone(&self, path: &Path) {
        let lock = self.locks.get_lock(path);
        let _guard = lock.lock();
        let mut record = self.store.get(path);
        record.contents = None;
        record.state = FileState::Deleted;
        record.stat = None;
        debug!(path = %path.display(), "staged delete");
        self.store.add(record);
    }
}
