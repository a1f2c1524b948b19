//! Binary content sniffer
//!
//! Decides whether file contents are binary, in which case they are copied
//! byte-for-byte and never passed through the template engine.

use std::path::Path;

/// Extensions that are always treated as binary, regardless of contents.
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "pdf", "zip", "gz", "tar", "tgz", "bz2",
    "xz", "7z", "rar", "jar", "war", "exe", "dll", "so", "dylib", "a", "o", "bin", "class",
    "wasm", "woff", "woff2", "ttf", "otf", "eot", "mp3", "mp4", "ogg", "wav", "avi", "mov",
    "sqlite", "db",
];

/// Number of leading bytes inspected for the null-byte heuristic.
const SNIFF_WINDOW: usize = 8000;

/// Classify `contents` as binary.
///
/// A known binary extension short-circuits; otherwise the first
/// [`SNIFF_WINDOW`] bytes are scanned for a null byte, the classic
/// text/binary heuristic.
pub fn is_binary(path: &Path, contents: &[u8]) -> bool {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        let ext = ext.to_ascii_lowercase();
        if BINARY_EXTENSIONS.contains(&ext.as_str()) {
            return true;
        }
    }
    let window = &contents[..contents.len().min(SNIFF_WINDOW)];
    window.contains(&0)
}
