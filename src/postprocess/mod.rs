//! Post-Processor
//!
//! A network-free second pass over a completed mirror: index it, rewrite
//! HTML/CSS/JS links against the walked layout, optionally strip
//! matching `<script>` elements and convert HTML-bearing `.php` files.

pub mod css;
pub mod html;
pub mod js;
mod processor;
pub mod site_index;
pub mod stats;
pub mod url_rewrite;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use regex::Regex;

pub use processor::run;
pub use site_index::{SiteIndex, synthesize_url_path};
pub use stats::{PostProcessStats, PostProcessSummary};
pub use url_rewrite::{Rewrite, UrlRewriter};

/// Configuration for one post-processing run.
#[derive(Debug, Clone)]
pub struct PostProcessConfig {
    /// The completed mirror being rewritten.
    pub input_dir: PathBuf,
    /// Where rewritten files land; equal to `input_dir` for in-place.
    pub output_dir: PathBuf,
    /// The host the mirror was downloaded from.
    pub host: String,
    /// Site root path the mirror was served under, `/` for the origin
    /// root.
    pub root_path: String,
    pub workers: usize,
    /// Pass external links through instead of touching them.
    pub keep_external: bool,
    /// Replace external and unresolvable links with `#`.
    pub remove_missing: bool,
    /// Write HTML-bearing `.php` files with a `.html` extension.
    pub php_to_html: bool,
    /// `<script>` blocks matching any of these are replaced by a
    /// comment.
    pub strip_script_patterns: Vec<Regex>,
}

impl PostProcessConfig {
    /// In-place processing of `input_dir` with default workers
    /// (2x CPU count).
    #[must_use]
    pub fn new(input_dir: impl Into<PathBuf>, host: impl Into<String>) -> Self {
        let input_dir = input_dir.into();
        Self {
            output_dir: input_dir.clone(),
            input_dir,
            host: host.into(),
            root_path: "/".to_string(),
            workers: num_cpus::get() * 2,
            keep_external: false,
            remove_missing: false,
            php_to_html: false,
            strip_script_patterns: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_root_path(mut self, root: impl Into<String>) -> Self {
        self.root_path = root.into();
        self
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    #[must_use]
    pub fn with_keep_external(mut self, keep: bool) -> Self {
        self.keep_external = keep;
        self
    }

    #[must_use]
    pub fn with_remove_missing(mut self, remove: bool) -> Self {
        self.remove_missing = remove;
        self
    }

    #[must_use]
    pub fn with_php_to_html(mut self, convert: bool) -> Self {
        self.php_to_html = convert;
        self
    }

    /// Compile and attach script-removal patterns.
    ///
    /// # Errors
    ///
    /// Returns an error for a pattern that does not compile; a setup
    /// failure.
    pub fn with_strip_scripts(mut self, patterns: &[String]) -> Result<Self> {
        self.strip_script_patterns = patterns
            .iter()
            .map(|p| Regex::new(p).map_err(|e| anyhow!("invalid script pattern '{p}': {e}")))
            .collect::<Result<Vec<_>>>()?;
        Ok(self)
    }
}
