//! Site index: one pre-walk of the mirror mapping URL paths to files.
//!
//! The index is what gives the post-processor more knowledge than the
//! in-crawl rewriter ever had: every file of the finished mirror, keyed
//! by the URL path it would have been served under, plus a basename map
//! for fallback searches.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jwalk::WalkDir;

/// URL-path ↔ file-path maps built by one walk of the mirror.
pub struct SiteIndex {
    url_to_file: HashMap<String, PathBuf>,
    file_to_url: HashMap<PathBuf, String>,
    basename_to_files: HashMap<String, Vec<PathBuf>>,
}

impl SiteIndex {
    /// Walk the mirror once and build the maps.
    ///
    /// # Errors
    ///
    /// Fails when the input directory cannot be walked.
    pub fn build(input_dir: &Path, root_path: &str, php_to_html: bool) -> Result<Self> {
        let mut url_to_file = HashMap::new();
        let mut file_to_url = HashMap::new();
        let mut basename_to_files: HashMap<String, Vec<PathBuf>> = HashMap::new();

        let parallelism = num_cpus::get().clamp(1, 8);
        for entry in WalkDir::new(input_dir)
            .parallelism(jwalk::Parallelism::RayonNewPool(parallelism))
            .skip_hidden(false)
            .follow_links(false)
        {
            let entry = entry.context("failed to walk mirror directory")?;
            if !entry.file_type().is_file() {
                continue;
            }

            let abs = entry.path();
            let Ok(rel) = abs.strip_prefix(input_dir) else {
                continue;
            };
            let rel = rel.to_string_lossy().replace('\\', "/");

            let url_path = synthesize_url_path(&rel, root_path, php_to_html);
            url_to_file.insert(url_path.clone(), abs.clone());
            file_to_url.insert(abs.clone(), url_path);

            if let Some(name) = abs.file_name().and_then(|n| n.to_str()) {
                basename_to_files
                    .entry(name.to_string())
                    .or_default()
                    .push(abs);
            }
        }

        Ok(Self {
            url_to_file,
            file_to_url,
            basename_to_files,
        })
    }

    /// Resolve a URL path to a mirror file, tolerating a trailing-slash
    /// mismatch.
    #[must_use]
    pub fn lookup(&self, url_path: &str) -> Option<&PathBuf> {
        if let Some(file) = self.url_to_file.get(url_path) {
            return Some(file);
        }
        if url_path.len() > 1
            && let Some(stripped) = url_path.strip_suffix('/')
            && let Some(file) = self.url_to_file.get(stripped)
        {
            return Some(file);
        }
        if url_path != "/" {
            if let Some(file) = self.url_to_file.get(&format!("{url_path}/")) {
                return Some(file);
            }
        }
        None
    }

    /// Recursive fallback: find a file by basename anywhere in the
    /// mirror. Only unambiguous matches are used.
    #[must_use]
    pub fn lookup_by_basename(&self, name: &str) -> Option<&PathBuf> {
        match self.basename_to_files.get(name) {
            Some(files) if files.len() == 1 => files.first(),
            _ => None,
        }
    }

    /// The URL path a mirror file was indexed under.
    #[must_use]
    pub fn url_for_file(&self, file: &Path) -> Option<&String> {
        self.file_to_url.get(file)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.url_to_file.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.url_to_file.is_empty()
    }
}

/// Synthesise the URL path a mirror file was served under.
///
/// `ru/chapters/1/index.html` → `/ru/chapters/1`, `about.html` →
/// `/about`, `index.html` → `/`, assets keep their path as-is.
#[must_use]
pub fn synthesize_url_path(rel: &str, root_path: &str, php_to_html: bool) -> String {
    let mut path = rel.to_string();

    if path == "index.html" || path == "index.htm" {
        path.clear();
    } else if let Some(head) = path.strip_suffix("/index.html") {
        path = head.to_string();
    } else if let Some(head) = path.strip_suffix("/index.htm") {
        path = head.to_string();
    } else if php_to_html && path.ends_with(".php") {
        path.truncate(path.len() - ".php".len());
    } else if path.ends_with(".html") {
        path.truncate(path.len() - ".html".len());
    } else if path.ends_with(".htm") {
        path.truncate(path.len() - ".htm".len());
    }

    let root = root_path.trim_end_matches('/');
    let mut url = format!("{root}/{path}");
    while url.len() > 1 && url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_files_collapse_to_directory() {
        assert_eq!(
            synthesize_url_path("ru/chapters/1/index.html", "/", false),
            "/ru/chapters/1"
        );
        assert_eq!(synthesize_url_path("index.html", "/", false), "/");
    }

    #[test]
    fn html_extension_stripped_from_non_index() {
        assert_eq!(synthesize_url_path("about.html", "/", false), "/about");
    }

    #[test]
    fn assets_keep_their_path() {
        assert_eq!(
            synthesize_url_path("assets/css/style.css", "/", false),
            "/assets/css/style.css"
        );
    }

    #[test]
    fn php_stripped_only_when_enabled() {
        assert_eq!(synthesize_url_path("cart.php", "/", true), "/cart");
        assert_eq!(synthesize_url_path("cart.php", "/", false), "/cart.php");
    }

    #[test]
    fn root_path_is_prepended() {
        assert_eq!(
            synthesize_url_path("docs/index.html", "/site", false),
            "/site/docs"
        );
        assert_eq!(synthesize_url_path("index.html", "/site", false), "/site");
    }
}
