//! Copy Engine
//!
//! Materializes one or many resolved sources into staged destination
//! records. Content is template-rendered when non-binary and a context is
//! supplied; destination path strings are rendered independently of content.
//! The async variant adds a content-processing hook and copies a multi-file
//! batch concurrently, with no defined completion order between files.

use crate::binary::is_binary;
use crate::error::EditorError;
use crate::glob::GlobOptions;
use crate::reconcile;
use crate::source::{self, CopyMode, SourceSpec};
use crate::store::{FileRecord, FileStat, Store};
use crate::template::TemplateSettings;
use crate::types::{FileState, TemplateContext};
use crate::Editor;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Hook invoked by the async copy variant on each file's contents before
/// templating.
#[async_trait]
pub trait ContentProcessor: Send + Sync {
    async fn process(&self, path: &Path, contents: Vec<u8>) -> Result<Vec<u8>, String>;
}

/// Configuration for copy and move operations.
pub struct CopyOptions {
    /// Concatenate onto an existing staged destination instead of
    /// overwriting. Requires a store with in-memory existence checks.
    pub append: bool,
    /// Treat zero resolved sources as a silent no-op instead of an error.
    pub ignore_no_match: bool,
    /// Forwarded to glob expansion.
    pub glob: GlobOptions,
    /// Template context; enables path and content rendering when set.
    pub context: Option<TemplateContext>,
    /// Delimiters for the template engine.
    pub template: TemplateSettings,
    /// Post-processing of computed destination paths (e.g. stripping a
    /// template-file extension), applied before path templating.
    pub process_destination_path: Option<Box<dyn Fn(&Path) -> PathBuf + Send + Sync>>,
}

impl Default for CopyOptions {
    fn default() -> Self {
        CopyOptions {
            append: false,
            ignore_no_match: false,
            glob: GlobOptions::default(),
            context: None,
            template: TemplateSettings::default(),
            process_destination_path: None,
        }
    }
}

impl CopyOptions {
    /// Options with a template context, rendering paths and contents.
    pub fn templated(context: TemplateContext) -> Self {
        CopyOptions {
            context: Some(context),
            ..CopyOptions::default()
        }
    }
}

/// Per-file inputs resolved before staging.
struct SourceData {
    contents: Vec<u8>,
    stat: Option<FileStat>,
    history: Vec<PathBuf>,
}

impl<S: Store> Editor<S> {
    /// Copy `from` (a literal path, an array, or glob patterns; in-store
    /// virtual files and on-disk files both qualify) to `to`.
    ///
    /// A single literal source with a literal destination copies
    /// file-to-file; every other shape treats `to` as a directory and lays
    /// sources out relative to their common base.
    pub fn copy(
        &self,
        from: impl Into<SourceSpec>,
        to: impl AsRef<Path>,
        options: &CopyOptions,
    ) -> Result<(), EditorError> {
        let plan = self.plan_copy(from.into(), to.as_ref(), options)?;
        for (src, dest) in plan {
            self.copy_single(&src, &dest, options)?;
        }
        Ok(())
    }

    /// Async variant of [`Editor::copy`]: disk reads suspend on tokio I/O,
    /// `processor` runs on each file's contents before templating, and a
    /// multi-file batch copies concurrently.
    ///
    /// Completion order between files is unspecified; each file's contents
    /// and history depend only on its own inputs. The first failure is
    /// surfaced after all siblings finish.
    pub async fn copy_async(
        &self,
        from: impl Into<SourceSpec>,
        to: impl AsRef<Path>,
        options: &CopyOptions,
        processor: Option<&dyn ContentProcessor>,
    ) -> Result<(), EditorError> {
        let plan = self.plan_copy(from.into(), to.as_ref(), options)?;
        let copies = plan
            .into_iter()
            .map(|(src, dest)| async move { self.copy_single_async(&src, &dest, options, processor).await });
        let results = futures::future::join_all(copies).await;
        for result in results {
            result?;
        }
        Ok(())
    }

    /// Resolve, classify, and reconcile a copy request into concrete
    /// (source, raw destination) pairs. Fails before any staging.
    fn plan_copy(
        &self,
        spec: SourceSpec,
        to: &Path,
        options: &CopyOptions,
    ) -> Result<Vec<(PathBuf, PathBuf)>, EditorError> {
        if options.append && !self.store.supports_memory_check() {
            return Err(EditorError::IncompatibleStore);
        }

        let to = self.resolve(to);
        let resolved = source::resolve(&spec, &self.cwd)?;
        match source::classify(&resolved, &self.store) {
            CopyMode::SingleFile(src) => Ok(vec![(src, to)]),
            CopyMode::Directory { candidates } => {
                let files = reconcile::resolve_files(&candidates, &self.store, &options.glob)?;
                if to.exists() && !to.is_dir() {
                    return Err(EditorError::DestinationShape { path: to });
                }
                if files.is_empty() {
                    if options.ignore_no_match {
                        return Ok(Vec::new());
                    }
                    return Err(EditorError::NoMatch {
                        patterns: candidates,
                    });
                }
                Ok(files
                    .into_iter()
                    .map(|file| {
                        let relative = file
                            .path
                            .strip_prefix(&resolved.common_base)
                            .map(Path::to_path_buf)
                            .unwrap_or_else(|_| {
                                PathBuf::from(file.path.file_name().unwrap_or_default())
                            });
                        let dest = to.join(relative);
                        (file.path, dest)
                    })
                    .collect())
            }
        }
    }

    fn copy_single(&self, from: &Path, to: &Path, options: &CopyOptions) -> Result<(), EditorError> {
        let to = self.finalize_destination(to, options)?;
        let data = self.read_source(from)?;
        self.stage_copy(from, &to, data, options)
    }

    async fn copy_single_async(
        &self,
        from: &Path,
        to: &Path,
        options: &CopyOptions,
        processor: Option<&dyn ContentProcessor>,
    ) -> Result<(), EditorError> {
        let to = self.finalize_destination(to, options)?;
        let mut data = self.read_source_async(from).await?;
        if let Some(processor) = processor {
            data.contents = processor
                .process(from, data.contents)
                .await
                .map_err(|reason| EditorError::Process {
                    path: from.to_path_buf(),
                    reason,
                })?;
        }
        self.stage_copy(from, &to, data, options)
    }

    /// Apply the destination-path hook, then path templating.
    fn finalize_destination(
        &self,
        to: &Path,
        options: &CopyOptions,
    ) -> Result<PathBuf, EditorError> {
        let to = match &options.process_destination_path {
            Some(hook) => hook(to),
            None => to.to_path_buf(),
        };
        match &options.context {
            Some(context) => {
                let text = to.to_string_lossy();
                let rendered = self
                    .template
                    .render(&text, context, &options.template)
                    .map_err(|reason| EditorError::Template {
                        path: to.clone(),
                        reason,
                    })?;
                Ok(PathBuf::from(rendered))
            }
            None => Ok(to),
        }
    }

    /// Obtain source contents, stat, and provenance from the store, which
    /// loads and caches the on-disk file on first touch.
    fn read_source(&self, from: &Path) -> Result<SourceData, EditorError> {
        let record = self.store.get(from);
        let contents = record.contents.ok_or_else(|| {
            EditorError::io(
                from,
                std::io::Error::new(std::io::ErrorKind::NotFound, "source does not exist"),
            )
        })?;
        Ok(SourceData {
            contents,
            stat: record.stat,
            history: record.history,
        })
    }

    async fn read_source_async(&self, from: &Path) -> Result<SourceData, EditorError> {
        if self.store.exists_in_memory(from) {
            return self.read_source(from);
        }
        let contents = tokio::fs::read(from)
            .await
            .map_err(|e| EditorError::io(from, e))?;
        let stat = tokio::fs::metadata(from)
            .await
            .ok()
            .map(|m| FileStat::from_metadata(&m));
        // Cache the loaded source so later touches see the same record
        // lifecycle as the sync path.
        if !self.store.exists_in_memory(from) {
            self.store.add(FileRecord {
                path: from.to_path_buf(),
                contents: Some(contents.clone()),
                state: FileState::Unmodified,
                stat: stat.clone(),
                history: vec![from.to_path_buf()],
            });
        }
        Ok(SourceData {
            contents,
            stat,
            history: vec![from.to_path_buf()],
        })
    }

    /// Template non-binary content, apply append semantics, and stage the
    /// destination record under its path lock.
    fn stage_copy(
        &self,
        from: &Path,
        to: &Path,
        data: SourceData,
        options: &CopyOptions,
    ) -> Result<(), EditorError> {
        let SourceData {
            contents,
            stat,
            mut history,
        } = data;

        let contents = match &options.context {
            Some(context) if !is_binary(from, &contents) => {
                // Content that fails UTF-8 decoding is copied byte-for-byte.
                match String::from_utf8(contents) {
                    Ok(text) => {
                        let rendered = self
                            .template
                            .render(&text, context, &options.template)
                            .map_err(|reason| EditorError::Template {
                                path: from.to_path_buf(),
                                reason,
                            })?;
                        rendered.into_bytes()
                    }
                    Err(raw) => raw.into_bytes(),
                }
            }
            _ => contents,
        };

        let lock = self.locks.get_lock(to);
        let _guard = lock.lock();

        let contents = if options.append && self.store.exists_in_memory(to) {
            match self.store.get(to).contents {
                Some(mut existing) => {
                    existing.extend_from_slice(&contents);
                    existing
                }
                None => contents,
            }
        } else {
            contents
        };

        history.push(to.to_path_buf());
        debug!(from = %from.display(), to = %to.display(), "staged copy");
        self.store.add(FileRecord {
            path: to.to_path_buf(),
            contents: Some(contents),
            state: FileState::Modified,
            stat,
            history,
        });
        Ok(())
    }
}
