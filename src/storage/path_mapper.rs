//! URL → on-disk path mapping.
//!
//! Two entry points share one algebra: [`save_rel_path`] maps a URL path
//! alone (host omitted) and is what the link rewriter diffs against;
//! [`strategy_path`] maps a full URL under the output root once the
//! analyzer has chosen a [`SaveStrategy`]. Both are deterministic and
//! emit forward-slash relative strings before any `PathBuf` is built.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use url::Url;

use super::strategy::SaveStrategy;
use crate::utils::constants::PAGE_EXTENSIONS;

/// Resolve `.` and `..` segments and drop empty ones.
///
/// Returns the cleaned path without a leading slash.
fn clean_dot_segments(url_path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in url_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Strip a known page extension (`.php`, `.html`, ...) from the last
/// segment of a cleaned path.
fn strip_page_extension(cleaned: &str) -> String {
    let last = cleaned.rsplit('/').next().unwrap_or_default();
    let lower = last.to_ascii_lowercase();
    for ext in PAGE_EXTENSIONS {
        let suffix = format!(".{ext}");
        if lower.ends_with(&suffix) && lower.len() > suffix.len() {
            return cleaned[..cleaned.len() - suffix.len()].to_string();
        }
    }
    cleaned.to_string()
}

/// Map a URL path (host omitted) to its on-disk relative path.
///
/// Rules, in order: empty/`/` → `index.html`; clean dot-segments; a last
/// segment without a dot is a directory and gets `/index.html` appended;
/// a `.php` file becomes `.html`; anything else is used as given.
#[must_use]
pub fn save_rel_path(url_path: &str) -> String {
    let cleaned = clean_dot_segments(url_path);
    if cleaned.is_empty() {
        return "index.html".to_string();
    }

    let last = cleaned.rsplit('/').next().unwrap_or_default();
    if !last.contains('.') {
        return format!("{cleaned}/index.html");
    }
    if last.to_ascii_lowercase().ends_with(".php") {
        return format!("{}.html", &cleaned[..cleaned.len() - ".php".len()]);
    }
    cleaned
}

/// Absolute on-disk path for a URL under the output root, using the
/// URL-only mapping of [`save_rel_path`].
///
/// # Errors
///
/// Returns an error when the URL has no host.
pub fn save_path(root: &Path, url: &Url) -> Result<PathBuf> {
    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("URL has no host: {url}"))?;
    Ok(root.join(host).join(save_rel_path(url.path())))
}

/// Absolute on-disk path for a URL once the analyzer has chosen a
/// strategy.
///
/// DirectoryIndex strips any page extension and a trailing `/index`
/// segment before appending `/index.html`; FileOnly uses the path as
/// given, with an empty path becoming `index.html`.
///
/// # Errors
///
/// Returns an error when the URL has no host.
pub fn strategy_path(root: &Path, url: &Url, strategy: SaveStrategy) -> Result<PathBuf> {
    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("URL has no host: {url}"))?;
    let cleaned = clean_dot_segments(url.path());

    let rel = match strategy {
        SaveStrategy::DirectoryIndex => {
            let mut dir = strip_page_extension(&cleaned);
            if dir == "index" {
                dir.clear();
            } else if let Some(head) = dir.strip_suffix("/index") {
                dir = head.to_string();
            }
            if dir.is_empty() {
                "index.html".to_string()
            } else {
                format!("{dir}/index.html")
            }
        }
        SaveStrategy::FileOnly => {
            if cleaned.is_empty() {
                "index.html".to_string()
            } else {
                cleaned
            }
        }
    };

    Ok(root.join(host).join(rel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_maps_to_index_html() {
        assert_eq!(save_rel_path("/"), "index.html");
        assert_eq!(save_rel_path(""), "index.html");
    }

    #[test]
    fn extensionless_paths_become_directories() {
        assert_eq!(save_rel_path("/blog/post"), "blog/post/index.html");
        assert_eq!(save_rel_path("/blog/"), "blog/index.html");
    }

    #[test]
    fn php_becomes_html() {
        assert_eq!(save_rel_path("/shop/cart.php"), "shop/cart.html");
    }

    #[test]
    fn dot_segments_clean_before_suffix_rules() {
        assert_eq!(save_rel_path("/a/b/../c/./d"), "a/c/d/index.html");
    }

    #[test]
    fn directory_index_strips_page_extension() {
        let root = Path::new("out");
        let url = Url::parse("https://ex.com/ru/chapters/1.html").unwrap();
        let path = strategy_path(root, &url, SaveStrategy::DirectoryIndex).unwrap();
        assert_eq!(path, Path::new("out/ex.com/ru/chapters/1/index.html"));
    }

    #[test]
    fn directory_index_collapses_trailing_index_segment() {
        let root = Path::new("out");
        let url = Url::parse("https://ex.com/docs/index.php").unwrap();
        let path = strategy_path(root, &url, SaveStrategy::DirectoryIndex).unwrap();
        assert_eq!(path, Path::new("out/ex.com/docs/index.html"));
    }

    #[test]
    fn file_only_keeps_path_as_given() {
        let root = Path::new("out");
        let url = Url::parse("https://ex.com/assets/css/style.css").unwrap();
        let path = strategy_path(root, &url, SaveStrategy::FileOnly).unwrap();
        assert_eq!(path, Path::new("out/ex.com/assets/css/style.css"));
    }

    #[test]
    fn file_only_empty_path_is_index() {
        let root = Path::new("out");
        let url = Url::parse("https://ex.com/").unwrap();
        let path = strategy_path(root, &url, SaveStrategy::FileOnly).unwrap();
        assert_eq!(path, Path::new("out/ex.com/index.html"));
    }
}
