//! FileRecord Store
//!
//! In-memory mapping from canonical path to pending file state. The store is
//! authoritative for staged edits; the real filesystem is only consulted for
//! paths it has never seen. All path normalization happens at this boundary
//! so callers never compare raw strings.

use crate::types::FileState;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

/// Metadata snapshot attached to a record, used for permission diffing
/// on commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileStat {
    /// Permission bits (`st_mode & 0o7777` on unix).
    pub mode: Option<u32>,
    /// Modification time at snapshot.
    pub mtime: Option<SystemTime>,
}

impl FileStat {
    pub fn from_metadata(metadata: &fs::Metadata) -> Self {
        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            Some(metadata.permissions().mode() & 0o7777)
        };
        #[cfg(not(unix))]
        let mode = None;

        FileStat {
            mode,
            mtime: metadata.modified().ok(),
        }
    }
}

/// The unit of staged state: one pending (or loaded) file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Canonical absolute key, OS-native. Unique per store.
    pub path: PathBuf,
    /// File bytes; `None` is the deletion tombstone.
    pub contents: Option<Vec<u8>>,
    /// Whether commit acts on this record.
    pub state: FileState,
    /// Metadata snapshot, when known.
    pub stat: Option<FileStat>,
    /// Append-only provenance chain; head is the earliest known origin.
    pub history: Vec<PathBuf>,
}

impl FileRecord {
    /// An empty record for a path with no on-disk counterpart.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        FileRecord {
            history: vec![path.clone()],
            path,
            contents: None,
            state: FileState::Unmodified,
            stat: None,
        }
    }

    /// A pending-deletion marker. Tombstones always carry null contents.
    pub fn tombstone(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        FileRecord {
            history: vec![path.clone()],
            path,
            contents: None,
            state: FileState::Deleted,
            stat: None,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.state == FileState::Deleted
    }

    /// Whether the record holds real content (loaded or staged).
    pub fn has_contents(&self) -> bool {
        self.contents.is_some()
    }
}

/// Lexically resolve `.` and `..` components without touching the disk.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve `input` against `cwd` into a cleaned absolute path.
pub fn resolve_path(cwd: &Path, input: &Path) -> PathBuf {
    let joined = if input.is_absolute() {
        input.to_path_buf()
    } else {
        cwd.join(input)
    };
    clean(dunce::simplified(&joined))
}

/// Platform-neutral comparison form of a path: cleaned, forward slashes.
///
/// Storage keys are derived from this; `FileRecord::path` keeps the
/// OS-native form.
pub fn normalize(path: &Path) -> String {
    let cleaned = clean(dunce::simplified(path));
    let text = cleaned.to_string_lossy();
    if cfg!(windows) {
        text.replace('\\', "/")
    } else {
        text.into_owned()
    }
}

/// Store interface. Implementations own normalization and disk fallback.
pub trait Store: Send + Sync {
    /// Fetch the record for `path`. A path the store has never seen is
    /// loaded from disk (or created empty) and cached as `Unmodified`, so
    /// records are created on first touch and mutated in place thereafter,
    /// never re-loaded as diverging clones.
    fn get(&self, path: &Path) -> FileRecord;

    /// Insert or replace the record under its normalized path key.
    fn add(&self, record: FileRecord);

    /// Whether `path` holds real contents, staged or on disk. Tombstones
    /// count as absent. Paths not in memory are probed with a stat rather
    /// than loaded.
    fn exists(&self, path: &Path) -> bool {
        if self.exists_in_memory(path) {
            self.get(path).contents.is_some()
        } else {
            path.is_file()
        }
    }

    /// Whether a record is loaded in memory for `path`. Distinguishes
    /// "staged/loaded" from "confirmed-real file"; required for append
    /// safety.
    fn exists_in_memory(&self, path: &Path) -> bool;

    /// Visit every record in insertion order.
    fn each(&self, visitor: &mut dyn FnMut(&FileRecord));

    /// Whether this store can answer [`Store::exists_in_memory`]. Append
    /// refuses to run against a store that cannot.
    fn supports_memory_check(&self) -> bool {
        true
    }
}

#[derive(Default)]
struct Inner {
    records: HashMap<String, FileRecord>,
    order: Vec<String>,
}

/// Default in-memory store. Interior locking keeps `&self` mutation safe
/// when multi-file copies stage records concurrently.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    fn load_from_disk(path: &Path) -> FileRecord {
        match fs::read(path) {
            Ok(bytes) => {
                let stat = fs::metadata(path).ok().map(|m| FileStat::from_metadata(&m));
                FileRecord {
                    path: path.to_path_buf(),
                    contents: Some(bytes),
                    state: FileState::Unmodified,
                    stat,
                    history: vec![path.to_path_buf()],
                }
            }
            Err(_) => FileRecord::new(path),
        }
    }
}

impl Store for MemoryStore {
    fn get(&self, path: &Path) -> FileRecord {
        let key = normalize(path);
        if let Some(record) = self.inner.read().records.get(&key) {
            return record.clone();
        }

        let loaded = Self::load_from_disk(path);
        let mut inner = self.inner.write();
        // Another thread may have loaded or staged the path meanwhile; the
        // record already in the store wins.
        if let Some(record) = inner.records.get(&key) {
            return record.clone();
        }
        inner.records.insert(key.clone(), loaded.clone());
        inner.order.push(key);
        loaded
    }

    fn add(&self, record: FileRecord) {
        let key = normalize(&record.path);
        let mut inner = self.inner.write();
        if inner.records.insert(key.clone(), record).is_none() {
            inner.order.push(key);
        }
    }

    fn exists_in_memory(&self, path: &Path) -> bool {
        self.inner.read().records.contains_key(&normalize(path))
    }

    fn each(&self, visitor: &mut dyn FnMut(&FileRecord)) {
        let inner = self.inner.read();
        for key in &inner.order {
            if let Some(record) = inner.records.get(key) {
                visitor(record);
            }
        }
    }
}
