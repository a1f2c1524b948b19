//! Source resolution and classification
//!
//! Turns a caller's source specification (one path, many paths, glob
//! patterns) into tagged [`Source`] variants resolved once up front, plus
//! the common base directory used to reconstruct relative layout for
//! directory-mode destinations.

use crate::error::EditorError;
use crate::glob::{is_dynamic_pattern, static_prefix};
use crate::store::{resolve_path, Store};
use std::path::{Path, PathBuf};

/// A caller-supplied source specification.
#[derive(Debug, Clone)]
pub enum SourceSpec {
    Single(String),
    Multi(Vec<String>),
}

impl From<&str> for SourceSpec {
    fn from(value: &str) -> Self {
        SourceSpec::Single(value.to_string())
    }
}

impl From<String> for SourceSpec {
    fn from(value: String) -> Self {
        SourceSpec::Single(value)
    }
}

impl From<Vec<String>> for SourceSpec {
    fn from(value: Vec<String>) -> Self {
        SourceSpec::Multi(value)
    }
}

impl From<&[&str]> for SourceSpec {
    fn from(value: &[&str]) -> Self {
        SourceSpec::Multi(value.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for SourceSpec {
    fn from(value: [&str; N]) -> Self {
        SourceSpec::Multi(value.iter().map(|s| s.to_string()).collect())
    }
}

/// One resolved source: a literal path or a dynamic glob pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Literal(PathBuf),
    Pattern(String),
}

impl Source {
    /// String form used for glob candidate lists and error messages.
    pub fn as_spec_string(&self) -> String {
        match self {
            Source::Literal(path) => path.display().to_string(),
            Source::Pattern(pattern) => pattern.clone(),
        }
    }
}

/// Output of the Path Resolver.
#[derive(Debug, Clone)]
pub struct ResolvedSources {
    pub sources: Vec<Source>,
    /// Common base directory across all inputs (literal parents and pattern
    /// static prefixes); strips down to relative layout in directory mode.
    pub common_base: PathBuf,
    /// Whether the caller passed an array.
    pub multi: bool,
}

/// Resolve a source specification against `cwd`.
///
/// Deterministic: no disk I/O beyond a directory check for the common base;
/// separator handling is platform-neutral.
pub fn resolve(spec: &SourceSpec, cwd: &Path) -> Result<ResolvedSources, EditorError> {
    let (raw, multi) = match spec {
        SourceSpec::Single(s) => (std::slice::from_ref(s), false),
        SourceSpec::Multi(list) => {
            if list.is_empty() {
                return Err(EditorError::Validation(
                    "source array must not be empty".to_string(),
                ));
            }
            (list.as_slice(), true)
        }
    };

    let mut sources = Vec::with_capacity(raw.len());
    for entry in raw {
        if entry.is_empty() {
            return Err(EditorError::Validation(
                "source path must not be empty".to_string(),
            ));
        }
        if is_dynamic_pattern(entry) {
            sources.push(Source::Pattern(absolutize_pattern(entry, cwd)));
        } else {
            sources.push(Source::Literal(resolve_path(cwd, Path::new(entry))));
        }
    }

    let common_base = common_base(&sources);
    Ok(ResolvedSources {
        sources,
        common_base,
        multi,
    })
}

fn absolutize_pattern(pattern: &str, cwd: &Path) -> String {
    if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        let mut base = cwd.display().to_string();
        if cfg!(windows) {
            base = base.replace('\\', "/");
        }
        format!("{}/{}", base.trim_end_matches('/'), pattern)
    }
}

/// Base directory contributed by one source: a directory literal is its own
/// base, a file literal contributes its parent, a pattern its static prefix.
fn source_base(source: &Source) -> PathBuf {
    match source {
        Source::Literal(path) => {
            if path.is_dir() {
                path.clone()
            } else {
                path.parent().map(Path::to_path_buf).unwrap_or_else(|| path.clone())
            }
        }
        Source::Pattern(pattern) => static_prefix(pattern),
    }
}

fn common_base(sources: &[Source]) -> PathBuf {
    let bases: Vec<PathBuf> = sources.iter().map(source_base).collect();
    let mut iter = bases.iter();
    let first = match iter.next() {
        Some(path) => path.clone(),
        None => return PathBuf::new(),
    };
    iter.fold(first, |acc, next| {
        acc.components()
            .zip(next.components())
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a)
            .collect()
    })
}

/// Policy decision produced by the Source Classifier.
#[derive(Debug)]
pub enum CopyMode {
    /// Single literal source copied to a literal destination path.
    SingleFile(PathBuf),
    /// Everything else: destination must be a directory and sources go
    /// through glob/store reconciliation.
    Directory { candidates: Vec<String> },
}

/// Classify resolved sources against the store and the disk.
///
/// The only file-to-file case is a single literal source that resolves to an
/// in-store or on-disk file; an array, a dynamic pattern, or an unresolved
/// literal all force directory mode.
pub fn classify(resolved: &ResolvedSources, store: &dyn Store) -> CopyMode {
    if !resolved.multi {
        if let [Source::Literal(path)] = resolved.sources.as_slice() {
            let in_store = store.exists_in_memory(path) && store.get(path).has_contents();
            if in_store || path.is_file() {
                return CopyMode::SingleFile(path.clone());
            }
        }
    }
    CopyMode::Directory {
        candidates: resolved
            .sources
            .iter()
            .map(Source::as_spec_string)
            .collect(),
    }
}
