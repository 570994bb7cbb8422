//! Resumable job state.
//!
//! The snapshot drains the frontier first, rebuilds it, then serializes,
//! so the on-disk copy is always consistent with an in-memory state
//! where the outstanding-work counter was zero.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::frontier::Frontier;
use super::job::CrawlJob;
use crate::config::CrawlConfig;

/// Serialized form of an interrupted (or finished) job.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobState {
    pub id: String,
    #[serde(rename = "rootURL")]
    pub root_url: String,
    #[serde(rename = "pendingURLs")]
    pub pending_urls: Vec<String>,
    #[serde(rename = "depthMap")]
    pub depth_map: HashMap<String, u32>,
    pub stats: HashMap<String, u64>,
    pub config: CrawlConfig,
}

/// Where a job's snapshot lives.
#[must_use]
pub fn state_file_path(output_dir: &Path, job_id: &str) -> PathBuf {
    output_dir.join(format!("{job_id}.state.json"))
}

/// Write a snapshot of the job to `<output_dir>/<id>.state.json`.
///
/// Pending work is the drained frontier plus any in-flight URLs, so a
/// fetch aborted by cancellation is re-fetched on resume.
pub async fn write_snapshot(job: &Arc<CrawlJob>, frontier: &Frontier) -> Result<PathBuf> {
    let drained = frontier.drain().await;

    let mut pending = job.in_flight();
    pending.extend(drained.iter().cloned());

    frontier.restore(drained, &job.cancel_token()).await;

    let mut stats = HashMap::new();
    stats.insert("totalFiles".to_string(), job.stats.files());
    stats.insert("bytes".to_string(), job.stats.bytes());
    stats.insert("failed".to_string(), job.stats.failed());
    stats.insert("skipped".to_string(), job.stats.skipped());

    let state = JobState {
        id: job.id().to_string(),
        root_url: job.config().root_url().to_string(),
        pending_urls: pending,
        depth_map: job.depth_map(),
        stats,
        config: job.config().clone(),
    };

    let path = state_file_path(job.config().output_dir(), job.id());
    let json = serde_json::to_vec_pretty(&state).context("failed to serialize job state")?;
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("failed to write state file {}", path.display()))?;

    log::info!(
        "State snapshot written: {} ({} pending URLs)",
        path.display(),
        state.pending_urls.len()
    );

    Ok(path)
}

/// Load a snapshot for `resume`.
///
/// A missing or corrupt state file is a setup failure, fatal before any
/// worker starts.
pub fn load_state(output_dir: &Path, job_id: &str) -> Result<JobState> {
    let path = state_file_path(output_dir, job_id);
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read state file {}", path.display()))?;
    let mut state: JobState = serde_json::from_str(&text)
        .with_context(|| format!("corrupt state file {}", path.display()))?;
    state.config.recompile_patterns()?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_round_trips_with_spec_field_names() {
        let config = CrawlConfig::builder()
            .output_dir("./out")
            .root_url("https://ex.com/")
            .build()
            .unwrap();

        let state = JobState {
            id: "deadbeef".to_string(),
            root_url: "https://ex.com/".to_string(),
            pending_urls: vec!["https://ex.com/a".to_string()],
            depth_map: HashMap::from([("https://ex.com/".to_string(), 0)]),
            stats: HashMap::from([("totalFiles".to_string(), 1)]),
            config,
        };

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"rootURL\""));
        assert!(json.contains("\"pendingURLs\""));
        assert!(json.contains("\"depthMap\""));

        let back: JobState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "deadbeef");
        assert_eq!(back.pending_urls.len(), 1);
        assert_eq!(back.depth_map.get("https://ex.com/"), Some(&0));
    }
}
