//! Scope filter: which discovered URLs belong to this mirror.

use anyhow::{Result, anyhow};
use url::Url;

use crate::config::CrawlConfig;
use crate::utils::constants::STATIC_ASSET_EXTENSIONS;
use crate::utils::{is_fetchable_url, resolve_protocol_relative};

/// Decides whether a candidate URL is in scope for download.
pub struct UrlFilter {
    domain: String,
    base_path: String,
    excluded: Vec<regex::Regex>,
}

impl UrlFilter {
    #[must_use]
    pub fn new(domain: impl Into<String>, base_path: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            base_path: base_path.into(),
            excluded: Vec::new(),
        }
    }

    /// Derive the filter from a job config: the root URL's host is the
    /// scope domain, its directory is the base path.
    ///
    /// # Errors
    ///
    /// Fails when the configured root URL does not parse or lacks a
    /// host; the builder has already rejected both cases.
    pub fn from_config(config: &CrawlConfig) -> Result<Self> {
        let root = Url::parse(config.root_url())
            .map_err(|e| anyhow!("invalid root URL '{}': {e}", config.root_url()))?;
        let domain = root
            .host_str()
            .ok_or_else(|| anyhow!("root URL has no host: {}", config.root_url()))?
            .to_string();

        let path = root.path();
        let base_path = if path.ends_with('/') {
            path.to_string()
        } else {
            match path.rfind('/') {
                Some(idx) => path[..=idx].to_string(),
                None => "/".to_string(),
            }
        };

        Ok(Self {
            domain,
            base_path,
            excluded: config.excluded_patterns_compiled().to_vec(),
        })
    }

    /// The ordered scope decision.
    ///
    /// Assets are in scope anywhere on the host; page candidates must
    /// live under the base path. The stricter source variant is kept:
    /// there is no blanket `.php` exemption.
    #[must_use]
    pub fn is_in_scope(&self, candidate: &str) -> bool {
        let candidate = resolve_protocol_relative(candidate);

        if !is_fetchable_url(&candidate) {
            return false;
        }
        let Ok(parsed) = Url::parse(&candidate) else {
            return false;
        };

        if parsed.host_str() != Some(self.domain.as_str()) {
            return false;
        }

        if self.excluded.iter().any(|re| re.is_match(&candidate)) {
            return false;
        }

        let path = parsed.path();
        if has_asset_extension(path) {
            return true;
        }

        path.starts_with(&self.base_path)
    }
}

fn has_asset_extension(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or_default();
    let Some((_, ext)) = last.rsplit_once('.') else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    STATIC_ASSET_EXTENSIONS.contains(&ext.as_str())
}
