//! Editor facade
//!
//! The `Editor` owns the store handle and the engine seams; every operation
//! goes through it, so there is no ambient singleton. Direct operations
//! (read, write, append, JSON helpers, move, dump) live here; copy, delete,
//! and commit are implemented in their own modules as further `impl` blocks.

use crate::concurrency::PathLockManager;
use crate::error::EditorError;
use crate::source::SourceSpec;
use crate::store::{resolve_path, FileRecord, MemoryStore, Store};
use crate::template::{PlaceholderEngine, TemplateEngine};
use crate::types::FileState;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Staged-mutation editor over an in-memory file store.
pub struct Editor<S: Store = MemoryStore> {
    pub(crate) store: S,
    pub(crate) template: Arc<dyn TemplateEngine>,
    pub(crate) locks: PathLockManager,
    pub(crate) cwd: PathBuf,
}

impl Editor<MemoryStore> {
    /// Editor over a fresh [`MemoryStore`], rooted at the process working
    /// directory.
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

impl Default for Editor<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Store> Editor<S> {
    pub fn with_store(store: S) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Editor {
            store,
            template: Arc::new(PlaceholderEngine),
            locks: PathLockManager::new(),
            cwd,
        }
    }

    /// Replace the base directory relative paths resolve against.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    /// Install a different template engine.
    pub fn with_template_engine(mut self, engine: Arc<dyn TemplateEngine>) -> Self {
        self.template = engine;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub(crate) fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        resolve_path(&self.cwd, path.as_ref())
    }

    /// Stage a record under its per-path lock.
    pub(crate) fn stage(&self, record: FileRecord) {
        let lock = self.locks.get_lock(&record.path);
        let _guard = lock.lock();
        self.store.add(record);
    }

    /// Read file bytes, preferring the staged record over disk.
    ///
    /// Tombstoned or missing paths are an error; use [`Editor::read_or`]
    /// for a defaulting variant.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<Vec<u8>, EditorError> {
        let resolved = self.resolve(path);
        let record = self.store.get(&resolved);
        record.contents.ok_or_else(|| {
            EditorError::io(
                &resolved,
                io::Error::new(io::ErrorKind::NotFound, "file does not exist"),
            )
        })
    }

    /// Read file bytes, falling back to `default` for missing or tombstoned
    /// paths.
    pub fn read_or(&self, path: impl AsRef<Path>, default: &[u8]) -> Vec<u8> {
        let record = self.store.get(&self.resolve(path));
        record.contents.unwrap_or_else(|| default.to_vec())
    }

    pub fn read_to_string(&self, path: impl AsRef<Path>) -> Result<String, EditorError> {
        let resolved = self.resolve(&path);
        let bytes = self.read(&resolved)?;
        String::from_utf8(bytes).map_err(|e| {
            EditorError::io(
                &resolved,
                io::Error::new(io::ErrorKind::InvalidData, e.to_string()),
            )
        })
    }

    /// Parse a staged or on-disk file as JSON.
    pub fn read_json<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> Result<T, EditorError> {
        let resolved = self.resolve(&path);
        let bytes = self.read(&resolved)?;
        serde_json::from_slice(&bytes).map_err(|source| EditorError::Json {
            path: resolved,
            source,
        })
    }

    /// Stage new contents for `path`. History is preserved for known paths
    /// and self-seeded for new ones.
    pub fn write(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        let resolved = self.resolve(path);
        let lock = self.locks.get_lock(&resolved);
        let _guard = lock.lock();
        let mut record = self.store.get(&resolved);
        record.contents = Some(contents.into());
        record.state = FileState::Modified;
        debug!(path = %resolved.display(), "staged write");
        self.store.add(record);
    }

    /// Serialize `value` as pretty-printed JSON (with trailing newline) and
    /// stage it.
    pub fn write_json<T: Serialize>(
        &self,
        path: impl AsRef<Path>,
        value: &T,
    ) -> Result<(), EditorError> {
        let resolved = self.resolve(&path);
        let mut text = serde_json::to_string_pretty(value).map_err(|source| EditorError::Json {
            path: resolved.clone(),
            source,
        })?;
        text.push('\n');
        self.write(resolved, text.into_bytes());
        Ok(())
    }

    /// Stage `contents` appended to the existing file, separated by
    /// `options.separator`.
    pub fn append(
        &self,
        path: impl AsRef<Path>,
        contents: &[u8],
        options: &AppendOptions,
    ) -> Result<(), EditorError> {
        if !self.store.supports_memory_check() {
            return Err(EditorError::IncompatibleStore);
        }
        let resolved = self.resolve(path);
        let lock = self.locks.get_lock(&resolved);
        let _guard = lock.lock();

        let mut record = self.store.get(&resolved);
        match record.contents.take() {
            Some(mut existing) => {
                existing.extend_from_slice(options.separator.as_bytes());
                existing.extend_from_slice(contents);
                record.contents = Some(existing);
            }
            None if options.create => {
                record.contents = Some(contents.to_vec());
            }
            None => {
                return Err(EditorError::io(
                    &resolved,
                    io::Error::new(io::ErrorKind::NotFound, "cannot append to missing file"),
                ));
            }
        }
        record.state = FileState::Modified;
        self.store.add(record);
        Ok(())
    }

    /// Whether `path` currently holds contents, staged or on disk.
    /// Tombstones count as absent.
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.store.exists(&self.resolve(path))
    }

    /// Whether a record is loaded for `path`, regardless of contents.
    pub fn exists_in_memory(&self, path: impl AsRef<Path>) -> bool {
        self.store.exists_in_memory(&self.resolve(path))
    }

    /// Copy the source specification to `to`, then tombstone the sources.
    pub fn move_files(
        &self,
        from: impl Into<SourceSpec>,
        to: impl AsRef<Path>,
        options: &crate::copy::CopyOptions,
    ) -> Result<(), EditorError> {
        let spec = from.into();
        self.copy(spec.clone(), to, options)?;
        self.delete(
            spec,
            &crate::delete::DeleteOptions {
                glob: options.glob.clone(),
                ignore_no_match: true,
            },
        )
    }

    /// Snapshot every interesting record (staged contents or pending state)
    /// keyed by path relative to `base`, for tests and tooling.
    pub fn dump(&self, base: impl AsRef<Path>) -> BTreeMap<String, DumpedFile> {
        let base = self.resolve(base);
        let mut out = BTreeMap::new();
        self.store.each(&mut |record| {
            if !record.has_contents() && record.state == FileState::Unmodified {
                return;
            }
            let key = match record.path.strip_prefix(&base) {
                Ok(relative) => relative.to_string_lossy().replace('\\', "/"),
                Err(_) => record.path.to_string_lossy().replace('\\', "/"),
            };
            out.insert(
                key,
                DumpedFile {
                    contents: record
                        .contents
                        .as_ref()
                        .map(|c| String::from_utf8_lossy(c).into_owned()),
                    state: record.state,
                },
            );
        });
        out
    }
}

/// Options for [`Editor::append`].
#[derive(Debug, Clone)]
pub struct AppendOptions {
    /// Inserted between existing and new contents.
    pub separator: String,
    /// Create the file when it does not exist instead of failing.
    pub create: bool,
}

impl Default for AppendOptions {
    fn default() -> Self {
        AppendOptions {
            separator: "\n".to_string(),
            create: false,
        }
    }
}

/// One entry of [`Editor::dump`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DumpedFile {
    #[serde(serialize_with = "serialize_contents")]
    pub contents: Option<String>,
    pub state: FileState,
}

fn serialize_contents<Ser: Serializer>(
    contents: &Option<String>,
    serializer: Ser,
) -> Result<Ser::Ok, Ser::Error> {
    match contents {
        Some(text) => serializer.serialize_str(text),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn write_then_read_round_trips_in_memory() {
        let dir = TempDir::new().unwrap();
        let editor = Editor::new().with_cwd(dir.path());

        editor.write("notes.txt", "draft");
        assert_eq!(editor.read("notes.txt").unwrap(), b"draft");
        // Nothing reached the disk.
        assert!(!dir.path().join("notes.txt").exists());
    }

    #[test]
    fn read_falls_back_to_disk() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("on-disk.txt"), "real").unwrap();

        let editor = Editor::new().with_cwd(dir.path());
        assert_eq!(editor.read("on-disk.txt").unwrap(), b"real");
    }

    #[test]
    fn read_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let editor = Editor::new().with_cwd(dir.path());
        assert!(matches!(
            editor.read("ghost.txt"),
            Err(EditorError::Io { .. })
        ));
        assert_eq!(editor.read_or("ghost.txt", b"fallback"), b"fallback");
    }

    #[test]
    fn append_joins_with_separator() {
        let dir = TempDir::new().unwrap();
        let editor = Editor::new().with_cwd(dir.path());

        editor.write("log.txt", "one");
        editor
            .append("log.txt", b"two", &AppendOptions::default())
            .unwrap();
        assert_eq!(editor.read_to_string("log.txt").unwrap(), "one\ntwo");
    }

    #[test]
    fn append_missing_requires_create() {
        let dir = TempDir::new().unwrap();
        let editor = Editor::new().with_cwd(dir.path());

        assert!(editor
            .append("fresh.txt", b"x", &AppendOptions::default())
            .is_err());
        editor
            .append(
                "fresh.txt",
                b"x",
                &AppendOptions {
                    create: true,
                    ..AppendOptions::default()
                },
            )
            .unwrap();
        assert_eq!(editor.read("fresh.txt").unwrap(), b"x");
    }

    #[test]
    fn json_helpers_round_trip() {
        let dir = TempDir::new().unwrap();
        let editor = Editor::new().with_cwd(dir.path());

        let value = serde_json::json!({"name": "stagefs", "major": 2});
        editor.write_json("meta.json", &value).unwrap();
        let back: serde_json::Value = editor.read_json("meta.json").unwrap();
        assert_eq!(back, value);
        assert!(editor.read_to_string("meta.json").unwrap().ends_with('\n'));
    }

    #[test]
    fn exists_is_tombstone_aware() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("doomed.txt");
        fs::write(&file, "x").unwrap();

        let editor = Editor::new().with_cwd(dir.path());
        assert!(editor.exists("doomed.txt"));
        editor
            .delete("doomed.txt", &crate::delete::DeleteOptions::default())
            .unwrap();
        assert!(!editor.exists("doomed.txt"));
        assert!(editor.exists_in_memory("doomed.txt"));
    }

    #[test]
    fn dump_reports_relative_paths_and_state() {
        let dir = TempDir::new().unwrap();
        let editor = Editor::new().with_cwd(dir.path());

        editor.write("a/b.txt", "b");
        let dump = editor.dump(dir.path());
        let entry = dump.get("a/b.txt").unwrap();
        assert_eq!(entry.contents.as_deref(), Some("b"));
        assert_eq!(entry.state, FileState::Modified);
    }
}
