//! YAML configuration file support.
//!
//! A `sitemirror.yaml` in the process working directory supplies
//! defaults for the crawl knobs; CLI flags override file values.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// File names probed in the working directory, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["sitemirror.yaml", "sitemirror.yml"];

/// Partial configuration loaded from disk. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub workers: Option<usize>,
    pub max_depth: Option<u32>,
    pub retries: Option<u32>,
    /// Base inter-attempt delay in milliseconds.
    pub delay: Option<u64>,
    pub max_file_size: Option<u64>,
    pub output_dir: Option<String>,
    pub user_agent: Option<String>,
}

impl FileConfig {
    /// Load the first config file present in the working directory.
    ///
    /// Returns `Ok(None)` when no file exists. A file that exists but
    /// does not parse is a setup failure.
    pub fn load_from_cwd() -> Result<Option<Self>> {
        for name in CONFIG_FILE_NAMES {
            let path = Path::new(name);
            if path.exists() {
                return Self::load(path).map(Some);
            }
        }
        Ok(None)
    }

    /// View the file values as an override layer.
    #[must_use]
    pub fn as_overrides(&self) -> super::types::ConfigOverrides {
        super::types::ConfigOverrides {
            workers: self.workers,
            max_depth: self.max_depth,
            retries: self.retries,
            delay: self.delay,
            max_file_size: self.max_file_size,
            output_dir: self.output_dir.clone().map(std::path::PathBuf::from),
            user_agent: self.user_agent.clone(),
        }
    }

    /// Load and parse one YAML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}
