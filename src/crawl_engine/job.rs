//! Shared per-job state handed to every worker.
//!
//! The visited set, depth map, and digest set live behind one job-wide
//! mutex with minimal critical sections; counters are atomics. Workers
//! receive an explicit `Arc<CrawlJob>` handle, never globals.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use xxhash_rust::xxh32::xxh32;

use crate::config::CrawlConfig;

/// Stable 8-hex-digit job identifier derived from the root URL.
///
/// Used only as an identifier (state file name, `resume` argument).
#[must_use]
pub fn job_id(root_url: &str) -> String {
    hex::encode(xxh32(root_url.as_bytes(), 0).to_be_bytes())
}

/// Atomic crawl counters.
#[derive(Debug, Default)]
pub struct CrawlStats {
    files: AtomicU64,
    bytes: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
}

impl CrawlStats {
    pub fn add_file(&self, bytes: u64) {
        self.files.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn add_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn files(&self) -> u64 {
        self.files.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Restore counters from a loaded snapshot.
    pub fn restore(&self, files: u64, bytes: u64, failed: u64, skipped: u64) {
        self.files.store(files, Ordering::Relaxed);
        self.bytes.store(bytes, Ordering::Relaxed);
        self.failed.store(failed, Ordering::Relaxed);
        self.skipped.store(skipped, Ordering::Relaxed);
    }
}

/// Maps guarded by the single job-wide mutex.
#[derive(Debug, Default)]
struct JobMaps {
    visited: HashSet<String>,
    depth: HashMap<String, u32>,
    /// Content digests seen this job. Statistics only; storage is never
    /// gated on membership.
    digests: HashSet<String>,
    /// URLs popped from the frontier but not yet finished. Folded into
    /// snapshots so a fetch aborted by cancellation is not lost.
    in_flight: HashSet<String>,
}

/// Shared state for one mirror job.
pub struct CrawlJob {
    id: String,
    config: CrawlConfig,
    maps: Mutex<JobMaps>,
    pub stats: CrawlStats,
    /// Units queued or executing. The frontier closes when this reaches
    /// zero, never on momentary queue emptiness.
    outstanding: AtomicUsize,
    started: Instant,
    cancel: CancellationToken,
    work_done: CancellationToken,
}

impl CrawlJob {
    #[must_use]
    pub fn new(config: CrawlConfig, cancel: CancellationToken) -> Self {
        Self {
            id: job_id(config.root_url()),
            config,
            maps: Mutex::new(JobMaps::default()),
            stats: CrawlStats::default(),
            outstanding: AtomicUsize::new(0),
            started: Instant::now(),
            cancel,
            work_done: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    #[must_use]
    pub fn started(&self) -> Instant {
        self.started
    }

    /// Check-and-mark a URL as visited, assign its depth, and take one
    /// outstanding-work unit. Returns false when already visited.
    ///
    /// The caller must either enqueue the URL or give the unit back with
    /// [`Self::finish_unit`].
    pub fn admit(&self, url: &str, depth: u32) -> bool {
        {
            let mut maps = self.maps.lock();
            if !maps.visited.insert(url.to_string()) {
                return false;
            }
            maps.depth.insert(url.to_string(), depth);
        }
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        true
    }

    /// Mark a loaded depth map as visited and re-take one unit per
    /// pending URL when resuming from a snapshot.
    pub fn restore(&self, depth_map: HashMap<String, u32>, pending: &[String]) {
        {
            let mut maps = self.maps.lock();
            for url in depth_map.keys() {
                maps.visited.insert(url.clone());
            }
            maps.depth.extend(depth_map);
        }
        self.outstanding.fetch_add(pending.len(), Ordering::SeqCst);
    }

    #[must_use]
    pub fn depth_of(&self, url: &str) -> Option<u32> {
        self.maps.lock().depth.get(url).copied()
    }

    /// Record a content digest; returns true when first seen.
    pub fn record_digest(&self, digest: &str) -> bool {
        self.maps.lock().digests.insert(digest.to_string())
    }

    /// Give back one outstanding-work unit; the last unit closes the
    /// frontier.
    pub fn finish_unit(&self) {
        if self.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.work_done.cancel();
        }
    }

    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    pub fn mark_in_flight(&self, url: &str) {
        self.maps.lock().in_flight.insert(url.to_string());
    }

    pub fn clear_in_flight(&self, url: &str) {
        self.maps.lock().in_flight.remove(url);
    }

    #[must_use]
    pub fn in_flight(&self) -> Vec<String> {
        self.maps.lock().in_flight.iter().cloned().collect()
    }

    #[must_use]
    pub fn depth_map(&self) -> HashMap<String, u32> {
        self.maps.lock().depth.clone()
    }

    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Fires when the outstanding-work counter reaches zero.
    #[must_use]
    pub fn work_done_token(&self) -> CancellationToken {
        self.work_done.clone()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> CrawlJob {
        let config = CrawlConfig::builder()
            .output_dir("./out")
            .root_url("https://ex.com/")
            .build()
            .unwrap();
        CrawlJob::new(config, CancellationToken::new())
    }

    #[test]
    fn job_id_is_stable_8_hex() {
        let a = job_id("https://ex.com/");
        let b = job_id("https://ex.com/");
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn admit_is_exactly_once() {
        let job = job();
        assert!(job.admit("https://ex.com/a", 1));
        assert!(!job.admit("https://ex.com/a", 2));
        assert_eq!(job.depth_of("https://ex.com/a"), Some(1));
        assert_eq!(job.outstanding(), 1);
    }

    #[test]
    fn last_unit_fires_work_done() {
        let job = job();
        job.admit("https://ex.com/a", 0);
        job.admit("https://ex.com/b", 1);
        job.finish_unit();
        assert!(!job.work_done_token().is_cancelled());
        job.finish_unit();
        assert!(job.work_done_token().is_cancelled());
    }

    #[test]
    fn digests_do_not_gate_anything() {
        let job = job();
        assert!(job.record_digest("abc"));
        assert!(!job.record_digest("abc"));
    }
}
