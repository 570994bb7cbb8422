//! Core configuration types for mirror jobs.
//!
//! A `CrawlConfig` is immutable for the lifetime of a job; changing any
//! knob means starting a new job. The struct round-trips through the
//! state snapshot, so everything but the precompiled regexes derives
//! serde.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::utils::constants::{
    DEFAULT_DELAY_MS, DEFAULT_MAX_DEPTH, DEFAULT_MAX_FILE_SIZE, DEFAULT_RETRIES, DEFAULT_USER_AGENT,
    DEFAULT_WORKERS,
};

/// Optional knob values layered over a base config, lowest priority
/// first: persisted job config, config file, CLI flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub workers: Option<usize>,
    pub max_depth: Option<u32>,
    pub retries: Option<u32>,
    pub delay: Option<u64>,
    pub max_file_size: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub user_agent: Option<String>,
}

/// Immutable configuration for one mirror job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Output root for the mirror.
    ///
    /// **INVARIANT:** Always an absolute path (normalized in the
    /// builder). This keeps path mapping, link rewriting, and the state
    /// snapshot consistent with each other.
    pub(crate) output_dir: PathBuf,
    /// Normalized root URL the crawl starts from.
    pub(crate) root_url: String,
    pub(crate) workers: usize,
    pub(crate) max_depth: u32,
    pub(crate) retries: u32,
    /// Base inter-attempt delay in milliseconds; jitter is added on top.
    pub(crate) delay: u64,
    pub(crate) max_file_size: u64,
    pub(crate) user_agent: String,
    /// Glob patterns excluding URLs from the crawl.
    pub(crate) excluded_patterns: Vec<String>,

    /// Compiled form of `excluded_patterns`, built once at config
    /// creation to keep regex compilation out of the hot path.
    #[serde(skip)]
    pub(crate) excluded_patterns_compiled: Vec<regex::Regex>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./mirror"),
            root_url: String::new(),
            workers: DEFAULT_WORKERS,
            max_depth: DEFAULT_MAX_DEPTH,
            retries: DEFAULT_RETRIES,
            delay: DEFAULT_DELAY_MS,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            excluded_patterns: Vec::new(),
            excluded_patterns_compiled: Vec::new(),
        }
    }
}

impl CrawlConfig {
    #[must_use]
    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    #[must_use]
    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    #[must_use]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    #[must_use]
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Base delay between retry attempts.
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay)
    }

    #[must_use]
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// The pre-compiled excluded patterns.
    #[must_use]
    pub fn excluded_patterns_compiled(&self) -> &[regex::Regex] {
        &self.excluded_patterns_compiled
    }

    /// Overlay explicitly-set values onto this config.
    ///
    /// Used by `resume`, where the persisted config is the base and the
    /// config file / CLI flags override it.
    ///
    /// # Errors
    ///
    /// Fails when an overridden output directory cannot be made
    /// absolute.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> anyhow::Result<()> {
        if let Some(workers) = overrides.workers {
            self.workers = workers.max(1);
        }
        if let Some(max_depth) = overrides.max_depth {
            self.max_depth = max_depth;
        }
        if let Some(retries) = overrides.retries {
            self.retries = retries;
        }
        if let Some(delay) = overrides.delay {
            self.delay = delay;
        }
        if let Some(max_file_size) = overrides.max_file_size {
            self.max_file_size = max_file_size;
        }
        if let Some(ref output_dir) = overrides.output_dir {
            self.output_dir = std::path::absolute(output_dir)
                .map_err(|e| anyhow::anyhow!("cannot resolve output directory: {e}"))?;
        }
        if let Some(ref user_agent) = overrides.user_agent {
            self.user_agent = user_agent.clone();
        }
        Ok(())
    }

    /// Recompile `excluded_patterns` after deserialization.
    ///
    /// `#[serde(skip)]` leaves the compiled set empty when a config is
    /// loaded back from a state snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if any stored pattern no longer compiles.
    pub fn recompile_patterns(&mut self) -> anyhow::Result<()> {
        self.excluded_patterns_compiled = self
            .excluded_patterns
            .iter()
            .map(|p| super::builder::compile_glob_pattern(p))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(())
    }
}
