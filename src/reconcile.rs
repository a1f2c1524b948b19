//! Glob/Store reconciliation
//!
//! Produces the definitive file list for a pattern-driven copy or delete.
//! Disk expansion runs first; a second scan over every store entry picks up
//! virtual files (records never written to disk) that satisfy the same
//! patterns. Disk results take precedence, so a virtual record shadowing an
//! on-disk path is never listed twice.

use crate::error::EditorError;
use crate::glob::{self, GlobOptions};
use crate::store::{normalize, Store};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::debug;

/// One file selected for copying or deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub path: PathBuf,
    /// True when the match came from the store scan rather than disk
    /// expansion.
    pub is_virtual: bool,
}

/// Resolve `candidates` (literal paths and glob patterns) into a
/// deduplicated file list drawn from disk and from the store.
pub fn resolve_files(
    candidates: &[String],
    store: &dyn Store,
    options: &GlobOptions,
) -> Result<Vec<ResolvedFile>, EditorError> {
    let disk = glob::expand(candidates, options)?;
    let mut seen: HashSet<String> = disk.iter().map(|p| normalize(p)).collect();
    let mut files: Vec<ResolvedFile> = disk
        .into_iter()
        .map(|path| ResolvedFile {
            path,
            is_virtual: false,
        })
        .collect();

    let set = glob::build_set(candidates, options)?;
    store.each(&mut |record| {
        // Tombstones and empty records cached by reads of missing paths are
        // not virtual files.
        if !record.has_contents() {
            return;
        }
        let spelled = record.path.display().to_string();
        if glob::is_dynamic_pattern(&spelled) {
            return;
        }
        if !glob::matches(&set, &record.path) {
            return;
        }
        if seen.insert(normalize(&record.path)) {
            files.push(ResolvedFile {
                path: record.path.clone(),
                is_virtual: true,
            });
        }
    });

    debug!(
        candidates = ?candidates,
        resolved = files.len(),
        "reconciled glob candidates"
    );
    Ok(files)
}
