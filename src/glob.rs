//! Glob expansion and matching
//!
//! Wraps `globset` for pattern matching and `walkdir` for disk expansion.
//! Patterns are matched against the store's normalized (forward-slash) path
//! form, so results are platform-neutral.

use crate::error::EditorError;
use crate::store::normalize;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Characters that make a source specifier a dynamic pattern rather than a
/// literal path.
const GLOB_METACHARS: &[char] = &['*', '?', '[', ']', '{', '}'];

/// Options forwarded to disk expansion.
#[derive(Debug, Clone, Default)]
pub struct GlobOptions {
    /// Follow symlinks while walking.
    pub follow_links: bool,
    /// Limit walk depth below each pattern's static prefix.
    pub max_depth: Option<usize>,
    /// Case-insensitive matching.
    pub case_insensitive: bool,
}

/// Whether `pattern` contains glob metacharacters.
pub fn is_dynamic_pattern(pattern: &str) -> bool {
    pattern.contains(GLOB_METACHARS)
}

/// The longest leading run of components with no metacharacters; the walk
/// root for disk expansion.
pub fn static_prefix(pattern: &str) -> PathBuf {
    let normalized = pattern.replace('\\', "/");
    let mut prefix = PathBuf::new();
    for component in normalized.split('/') {
        if component.contains(GLOB_METACHARS) {
            break;
        }
        if component.is_empty() {
            // Leading empty component is the root slash.
            if prefix.as_os_str().is_empty() {
                prefix.push("/");
            }
            continue;
        }
        prefix.push(component);
    }
    prefix
}

fn compile(pattern: &str, options: &GlobOptions) -> Result<globset::Glob, EditorError> {
    let normalized = if cfg!(windows) {
        pattern.replace('\\', "/")
    } else {
        pattern.to_string()
    };
    GlobBuilder::new(&normalized)
        .literal_separator(true)
        .case_insensitive(options.case_insensitive)
        .build()
        .map_err(|e| EditorError::Pattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// Compile `patterns` into one matcher set.
pub fn build_set(patterns: &[String], options: &GlobOptions) -> Result<GlobSet, EditorError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(compile(pattern, options)?);
    }
    builder.build().map_err(|e| EditorError::Pattern {
        pattern: patterns.join(", "),
        reason: e.to_string(),
    })
}

/// Whether the normalized form of `path` matches any pattern in `set`.
pub fn matches(set: &GlobSet, path: &Path) -> bool {
    set.is_match(normalize(path))
}

/// Expand `patterns` against the real filesystem.
///
/// Results are absolute file paths (directories are excluded), deduplicated,
/// in walk order. Literal patterns contribute themselves when a file exists
/// at that path.
pub fn expand(patterns: &[String], options: &GlobOptions) -> Result<Vec<PathBuf>, EditorError> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut results = Vec::new();

    for pattern in patterns {
        if !is_dynamic_pattern(pattern) {
            let literal = PathBuf::from(pattern);
            if literal.is_file() && seen.insert(normalize(&literal)) {
                results.push(literal);
            }
            continue;
        }

        let matcher = compile(pattern, options)?.compile_matcher();
        let root = static_prefix(pattern);
        if !root.is_dir() {
            continue;
        }

        let mut walk = WalkDir::new(&root).follow_links(options.follow_links);
        if let Some(depth) = options.max_depth {
            walk = walk.max_depth(depth);
        }
        for entry in walk.into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if matcher.is_match(normalize(path)) && seen.insert(normalize(path)) {
                results.push(path.to_path_buf());
            }
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn detects_dynamic_patterns() {
        assert!(is_dynamic_pattern("src/*.rs"));
        assert!(is_dynamic_pattern("src/**/mod.rs"));
        assert!(is_dynamic_pattern("file-?.txt"));
        assert!(!is_dynamic_pattern("src/lib.rs"));
    }

    #[test]
    fn static_prefix_stops_at_first_metachar() {
        assert_eq!(static_prefix("/a/b/*.txt"), PathBuf::from("/a/b"));
        assert_eq!(static_prefix("/a/**/c"), PathBuf::from("/a"));
        assert_eq!(static_prefix("/a/b/c.txt"), PathBuf::from("/a/b/c.txt"));
    }

    #[test]
    fn expand_finds_files_not_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("one.txt"), "1").unwrap();
        fs::write(dir.path().join("two.txt"), "2").unwrap();
        fs::write(dir.path().join("three.md"), "3").unwrap();

        let pattern = format!("{}/*.txt", dir.path().display());
        let mut found = expand(&[pattern], &GlobOptions::default()).unwrap();
        found.sort();
        assert_eq!(
            found,
            vec![dir.path().join("one.txt"), dir.path().join("two.txt")]
        );
    }

    #[test]
    fn expand_recurses_with_double_star() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/b/deep.txt"), "x").unwrap();

        let pattern = format!("{}/**/*.txt", dir.path().display());
        let found = expand(&[pattern], &GlobOptions::default()).unwrap();
        assert_eq!(found, vec![dir.path().join("a/b/deep.txt")]);
    }

    #[test]
    fn expand_deduplicates_overlapping_patterns() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "x").unwrap();

        let p1 = format!("{}/*.txt", dir.path().display());
        let p2 = format!("{}/a.*", dir.path().display());
        let found = expand(&[p1, p2], &GlobOptions::default()).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn literal_pattern_expands_to_itself_when_on_disk() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("lit.txt");
        fs::write(&file, "x").unwrap();

        let found = expand(
            &[file.display().to_string()],
            &GlobOptions::default(),
        )
        .unwrap();
        assert_eq!(found, vec![file]);
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let err = expand(&["/a/[".to_string()], &GlobOptions::default()).unwrap_err();
        assert!(matches!(err, EditorError::Pattern { .. }));
    }
}
