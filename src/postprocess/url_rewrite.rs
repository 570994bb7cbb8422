//! Index-backed URL rewriting for the post-pass.
//!
//! Unlike the in-crawl rewriter, which only ever sees two URLs, this one
//! holds the full site index and can therefore resolve a link to the
//! actual file the mirror contains — or know for certain that it is
//! missing.

use std::path::{Path, PathBuf};

use url::Url;

use super::site_index::SiteIndex;
use crate::utils::constants::ASSET_ROOT_DIRS;
use crate::utils::resolve_protocol_relative;

/// Prefixes that are never rewritten.
const OPAQUE_PREFIXES: &[&str] = &["#", "javascript:", "mailto:", "tel:", "data:", "file:"];

/// Outcome of rewriting one URL; the caller updates the document and
/// the statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// Same-host target found in the mirror; the new relative value.
    Internal(String),
    /// Foreign host; `Some("#")` when the link is being removed.
    External(Option<String>),
    /// Same host but no local target; `Some("#")` when removed.
    Missing(Option<String>),
    /// Opaque scheme or unparseable input; leave untouched.
    Skip,
}

/// Shared rewriting context for one post-processing run.
pub struct UrlRewriter<'a> {
    index: &'a SiteIndex,
    input_dir: &'a Path,
    host: String,
    keep_external: bool,
    remove_missing: bool,
    php_to_html: bool,
}

impl<'a> UrlRewriter<'a> {
    #[must_use]
    pub fn new(
        index: &'a SiteIndex,
        input_dir: &'a Path,
        host: impl Into<String>,
        keep_external: bool,
        remove_missing: bool,
        php_to_html: bool,
    ) -> Self {
        Self {
            index,
            input_dir,
            host: host.into(),
            keep_external,
            remove_missing,
            php_to_html,
        }
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Rewrite one URL found inside `current_file`.
    #[must_use]
    pub fn rewrite(&self, original: &str, current_file: &Path) -> Rewrite {
        let trimmed = original.trim();
        if trimmed.is_empty() || OPAQUE_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
            return Rewrite::Skip;
        }

        let absolute = resolve_protocol_relative(trimmed);

        let target = if let Ok(parsed) = Url::parse(&absolute) {
            if parsed.host_str() != Some(self.host.as_str()) {
                return self.external();
            }
            parsed
        } else {
            // Relative or site-rooted: resolve against the URL of the
            // directory this file lives in.
            let Some(base) = self.base_url_for(current_file) else {
                return Rewrite::Skip;
            };
            let Ok(joined) = base.join(trimmed) else {
                return Rewrite::Skip;
            };
            joined
        };

        let mut suffix = String::new();
        if let Some(query) = target.query() {
            suffix.push('?');
            suffix.push_str(query);
        }
        if let Some(fragment) = target.fragment() {
            suffix.push('#');
            suffix.push_str(fragment);
        }

        let path = target.path();
        let found = self.index.lookup(path).or_else(|| {
            let name = path.rsplit('/').next().unwrap_or_default();
            if name.contains('.') {
                self.index.lookup_by_basename(name)
            } else {
                None
            }
        });

        match found {
            Some(file) => {
                let rel = self.relative_to(current_file, file);
                Rewrite::Internal(format!("{rel}{suffix}"))
            }
            None => {
                if self.remove_missing {
                    Rewrite::Missing(Some("#".to_string()))
                } else {
                    Rewrite::Missing(None)
                }
            }
        }
    }

    fn external(&self) -> Rewrite {
        if self.keep_external {
            Rewrite::External(None)
        } else if self.remove_missing {
            Rewrite::External(Some("#".to_string()))
        } else {
            Rewrite::External(None)
        }
    }

    /// The served URL of the directory containing a mirror file.
    fn base_url_for(&self, current_file: &Path) -> Option<Url> {
        let rel_dir = current_file
            .parent()
            .and_then(|p| p.strip_prefix(self.input_dir).ok())
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();

        let base = if rel_dir.is_empty() {
            format!("https://{}/", self.host)
        } else {
            format!("https://{}/{rel_dir}/", self.host)
        };
        Url::parse(&base).ok()
    }

    /// Relative path from `current_file`'s directory to `target`.
    ///
    /// Targets under a top-level asset directory short-circuit to an
    /// `../×n` walk up to the mirror root; everything else goes through
    /// the generic diff.
    fn relative_to(&self, current_file: &Path, target: &PathBuf) -> String {
        let target_rel = target
            .strip_prefix(self.input_dir)
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_else(|_| target.to_string_lossy().replace('\\', "/"));

        let current_dir = current_file.parent().unwrap_or_else(|| Path::new(""));

        let first_component = target_rel.split('/').next().unwrap_or_default();
        let mut rel = if ASSET_ROOT_DIRS.contains(&first_component) {
            let depth = current_dir
                .strip_prefix(self.input_dir)
                .map(|p| p.components().count())
                .unwrap_or(0);
            format!("{}{target_rel}", "../".repeat(depth))
        } else {
            pathdiff::diff_paths(target, current_dir)
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or(target_rel)
        };

        // A .php target is emitted as .html when conversion is on.
        if self.php_to_html && rel.ends_with(".php") {
            rel.truncate(rel.len() - ".php".len());
            rel.push_str(".html");
        }

        rel
    }
}
