//! Core types for the staged filesystem mutation system.

use serde::{Deserialize, Serialize};

/// Pending-state classification of a [`crate::store::FileRecord`].
///
/// `Unmodified` records are ignored by commit; `Modified` records are written
/// out; `Deleted` records are tombstones whose files are removed from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileState {
    Unmodified,
    Modified,
    Deleted,
}

/// Key/value context handed to the template engine when rendering
/// destination paths and non-binary file contents.
pub type TemplateContext = serde_json::Map<String, serde_json::Value>;
