//! Save-strategy analysis: choose a filesystem layout per artifact.
//!
//! The strategy set is closed (two variants), so the analyzer is a plain
//! ordered rule chain over the URL path, the response content-type, and a
//! short content sniff. First match wins.

use crate::utils::constants::{
    API_PATH_SEGMENTS, PAGE_EXTENSIONS, RESOURCE_DIR_SEGMENTS, SNIFF_WINDOW,
    STATIC_ASSET_EXTENSIONS,
};

/// How an artifact lands on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStrategy {
    /// The URL is treated as a directory; content goes to
    /// `<host>/<path>/index.html` with any page extension and a trailing
    /// `/index` segment stripped first.
    DirectoryIndex,
    /// The URL names a specific file; content goes to `<host>/<path>`.
    FileOnly,
}

/// Content-type fragments that always mean a standalone file.
const FILE_CONTENT_TYPES: &[&str] = &[
    "text/css",
    "application/javascript",
    "application/x-javascript",
    "image/",
    "font/",
    "audio/",
    "video/",
    "application/pdf",
    "application/zip",
    "application/json",
    "application/xml",
];

/// The extension of the last path segment, lowercased, if any.
fn path_extension(url_path: &str) -> Option<String> {
    let last = url_path.rsplit('/').next()?;
    let (_, ext) = last.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

/// Decide the save strategy for one fetched artifact.
#[must_use]
pub fn analyze(url_path: &str, content_type: &str, content: &[u8]) -> SaveStrategy {
    let ext = path_extension(url_path);
    let ct = content_type.to_ascii_lowercase();

    // 1. Known resource extension in the path.
    if let Some(ref ext) = ext
        && STATIC_ASSET_EXTENSIONS.contains(&ext.as_str())
    {
        return SaveStrategy::FileOnly;
    }

    // 2-3. Explicit content-type signals.
    if FILE_CONTENT_TYPES.iter().any(|t| ct.contains(t)) {
        return SaveStrategy::FileOnly;
    }
    if ct.contains("text/html") {
        return SaveStrategy::DirectoryIndex;
    }

    // 4. Opaque content-type: sniff, then fall back to page extensions.
    // Guards against a mis-labelled HTML page being stored flat.
    if ct.is_empty() || ct.contains("application/octet-stream") {
        let window = &content[..content.len().min(SNIFF_WINDOW)];
        let head = String::from_utf8_lossy(window).to_ascii_lowercase();
        if ["<!doctype", "<html", "<head", "<body"]
            .iter()
            .any(|marker| head.contains(marker))
        {
            return SaveStrategy::DirectoryIndex;
        }
        if let Some(ref ext) = ext
            && PAGE_EXTENSIONS.contains(&ext.as_str())
        {
            return SaveStrategy::DirectoryIndex;
        }
    }

    // 5. Resource directories.
    if RESOURCE_DIR_SEGMENTS.iter().any(|s| url_path.contains(s)) {
        return SaveStrategy::FileOnly;
    }

    // 6. Extension-less non-API paths read as pages.
    if ext.is_none()
        && url_path != "/"
        && !API_PATH_SEGMENTS.iter().any(|s| url_path.contains(s))
    {
        return SaveStrategy::DirectoryIndex;
    }

    SaveStrategy::DirectoryIndex
}
