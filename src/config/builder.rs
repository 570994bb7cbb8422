//! Type-safe builder for `CrawlConfig` using the typestate pattern.
//!
//! The two required fields (`output_dir`, then `root_url`) are enforced
//! at compile time; `build()` only exists once both are set.

use std::marker::PhantomData;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use regex::Regex;
use url::Url;

use super::types::CrawlConfig;

/// Compile a glob pattern into a regex.
///
/// `*` matches any sequence; the pattern is anchored to the full URL.
/// Compiled once at config creation time to keep the hot path free of
/// regex compilation.
///
/// # Errors
///
/// Returns an error if the resulting regex pattern is invalid.
pub fn compile_glob_pattern(pattern: &str) -> Result<Regex> {
    let regex_pattern = regex::escape(pattern).replace(r"\*", ".*");
    let anchored = format!("^{regex_pattern}$");
    Regex::new(&anchored).map_err(|e| anyhow!("invalid glob pattern '{pattern}': {e}"))
}

// Type states for the builder
pub struct WithOutputDir;
pub struct WithRootUrl;

pub struct CrawlConfigBuilder<State = ()> {
    pub(crate) config: CrawlConfig,
    pub(crate) _phantom: PhantomData<State>,
}

impl CrawlConfig {
    /// Create a builder with a fluent interface.
    #[must_use]
    pub fn builder() -> CrawlConfigBuilder<()> {
        CrawlConfigBuilder {
            config: CrawlConfig::default(),
            _phantom: PhantomData,
        }
    }
}

impl CrawlConfigBuilder<()> {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> CrawlConfigBuilder<WithOutputDir> {
        self.config.output_dir = dir.into();
        CrawlConfigBuilder {
            config: self.config,
            _phantom: PhantomData,
        }
    }
}

impl CrawlConfigBuilder<WithOutputDir> {
    pub fn root_url(mut self, url: impl Into<String>) -> CrawlConfigBuilder<WithRootUrl> {
        let url = url.into();
        // A bare host is promoted to https://.
        self.config.root_url = if url.starts_with("http://") || url.starts_with("https://") {
            url
        } else {
            format!("https://{url}")
        };
        CrawlConfigBuilder {
            config: self.config,
            _phantom: PhantomData,
        }
    }
}

// Optional knobs, available at any builder state.
impl<State> CrawlConfigBuilder<State> {
    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers.max(1);
        self
    }

    #[must_use]
    pub fn max_depth(mut self, depth: u32) -> Self {
        self.config.max_depth = depth;
        self
    }

    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    /// Base inter-attempt delay in milliseconds.
    #[must_use]
    pub fn delay_ms(mut self, delay: u64) -> Self {
        self.config.delay = delay;
        self
    }

    #[must_use]
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// URL glob patterns excluded from the crawl.
    #[must_use]
    pub fn excluded_patterns(mut self, patterns: Vec<String>) -> Self {
        self.config.excluded_patterns = patterns;
        self
    }
}

// Build only once both required fields are set.
impl CrawlConfigBuilder<WithRootUrl> {
    /// Validate and finish the config.
    ///
    /// # Errors
    ///
    /// Fails when the root URL does not parse as http(s) with a host,
    /// when the output directory cannot be made absolute, or when an
    /// excluded pattern does not compile. These are setup failures,
    /// fatal before any worker starts.
    pub fn build(mut self) -> Result<CrawlConfig> {
        let parsed = Url::parse(&self.config.root_url)
            .map_err(|e| anyhow!("invalid root URL '{}': {e}", self.config.root_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(anyhow!(
                "root URL must be http or https: {}",
                self.config.root_url
            ));
        }
        if parsed.host_str().is_none() {
            return Err(anyhow!("root URL has no host: {}", self.config.root_url));
        }

        self.config.output_dir = std::path::absolute(&self.config.output_dir)
            .map_err(|e| anyhow!("cannot resolve output directory: {e}"))?;

        self.config.recompile_patterns()?;

        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_promoted_to_https() {
        let config = CrawlConfig::builder()
            .output_dir("./out")
            .root_url("ex.com/docs")
            .build()
            .unwrap();
        assert_eq!(config.root_url(), "https://ex.com/docs");
    }

    #[test]
    fn output_dir_is_absolute() {
        let config = CrawlConfig::builder()
            .output_dir("./out")
            .root_url("https://ex.com")
            .build()
            .unwrap();
        assert!(config.output_dir().is_absolute());
    }

    #[test]
    fn rejects_bad_scheme() {
        assert!(
            CrawlConfig::builder()
                .output_dir("./out")
                .root_url("ftp://ex.com")
                .build()
                .is_err()
        );
    }

    #[test]
    fn glob_patterns_compile_and_match() {
        let config = CrawlConfig::builder()
            .output_dir("./out")
            .root_url("https://ex.com")
            .excluded_patterns(vec!["*/tag/*".to_string()])
            .build()
            .unwrap();
        let compiled = config.excluded_patterns_compiled();
        assert_eq!(compiled.len(), 1);
        assert!(compiled[0].is_match("https://ex.com/blog/tag/rust"));
        assert!(!compiled[0].is_match("https://ex.com/blog/post"));
    }
}
