//! Atomic statistics for a post-processing run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters shared by every post-process worker.
#[derive(Debug, Default)]
pub struct PostProcessStats {
    total: AtomicU64,
    processed: AtomicU64,
    modified: AtomicU64,
    failed: AtomicU64,
    links_rewritten: AtomicU64,
    external: AtomicU64,
}

impl PostProcessStats {
    pub fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
    }

    pub fn add_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_modified(&self) {
        self.modified.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_links_rewritten(&self, n: u64) {
        self.links_rewritten.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_external(&self, n: u64) {
        self.external.fetch_add(n, Ordering::Relaxed);
    }

    #[must_use]
    pub fn summary(&self, duration: Duration) -> PostProcessSummary {
        PostProcessSummary {
            total: self.total.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            modified: self.modified.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            links_rewritten: self.links_rewritten.load(Ordering::Relaxed),
            external: self.external.load(Ordering::Relaxed),
            duration,
        }
    }
}

/// Final numbers for one run.
#[derive(Debug, Clone)]
pub struct PostProcessSummary {
    pub total: u64,
    pub processed: u64,
    pub modified: u64,
    pub failed: u64,
    pub links_rewritten: u64,
    pub external: u64,
    pub duration: Duration,
}
