//! Crawl Engine
//!
//! Worker pool, bounded frontier, shared job state, progress reporting,
//! and resumable snapshots. The engine seeds the frontier, spawns
//! `workers` symmetric worker tasks plus one reporter, and terminates
//! when the outstanding-work counter reaches zero or the job is
//! cancelled; either way a final state snapshot is written.

pub mod events;
pub mod frontier;
pub mod job;
pub mod progress;
pub mod state;
pub mod url_filter;
mod worker;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::CrawlConfig;
use crate::fetcher::Fetcher;
use crate::rewriter::HandlerPipeline;
use crate::utils::constants::{DISCOVERY_PATHS, FRONTIER_CAPACITY};
use crate::utils::normalize_url;

pub use events::EventSink;
pub use frontier::Frontier;
pub use job::{CrawlJob, CrawlStats, job_id};
pub use state::{JobState, load_state, state_file_path, write_snapshot};
pub use url_filter::UrlFilter;

/// What a finished (or cancelled) job looked like.
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub job_id: String,
    pub files: u64,
    pub bytes: u64,
    pub failed: u64,
    pub skipped: u64,
    pub duration: Duration,
    pub cancelled: bool,
}

/// Run a fresh mirror job to completion.
///
/// # Errors
///
/// Setup failures only (bad root URL, unwritable output directory);
/// per-page failures surface through the counters.
pub async fn run_crawl(
    config: CrawlConfig,
    events: EventSink,
    cancel: CancellationToken,
) -> Result<CrawlSummary> {
    tokio::fs::create_dir_all(config.output_dir())
        .await
        .with_context(|| {
            format!(
                "cannot create output directory {}",
                config.output_dir().display()
            )
        })?;

    let root = normalize_url(config.root_url()).context("invalid root URL")?;
    let root_parsed = Url::parse(&root).context("invalid root URL")?;

    let job = Arc::new(CrawlJob::new(config, cancel.clone()));
    let frontier = Arc::new(Frontier::new());

    // Seed the root, then the fixed discovery list, all at depth 0. The
    // discovery paths live at the origin root by definition, so they
    // bypass the base-path filter but still go through the visited set.
    if job.admit(&root, 0) && !frontier.push(root, &cancel).await {
        job.finish_unit();
    }
    for path in DISCOVERY_PATHS {
        let Ok(joined) = root_parsed.join(path) else {
            continue;
        };
        let Ok(canonical) = normalize_url(joined.as_str()) else {
            continue;
        };
        if job.admit(&canonical, 0) && !frontier.push(canonical, &cancel).await {
            job.finish_unit();
        }
    }

    execute(job, frontier, events).await
}

/// Resume an interrupted job from its snapshot.
///
/// The caller loads the snapshot (applying any CLI overrides to its
/// config) via [`load_state`]; this rebuilds the frontier, marks the
/// depth map visited, and re-takes one work unit per pending URL.
pub async fn resume_crawl(
    state: JobState,
    events: EventSink,
    cancel: CancellationToken,
) -> Result<CrawlSummary> {
    let config = state.config.clone();
    tokio::fs::create_dir_all(config.output_dir())
        .await
        .with_context(|| {
            format!(
                "cannot create output directory {}",
                config.output_dir().display()
            )
        })?;

    let job = Arc::new(CrawlJob::new(config, cancel.clone()));

    job.stats.restore(
        state.stats.get("totalFiles").copied().unwrap_or(0),
        state.stats.get("bytes").copied().unwrap_or(0),
        state.stats.get("failed").copied().unwrap_or(0),
        state.stats.get("skipped").copied().unwrap_or(0),
    );
    job.restore(state.depth_map, &state.pending_urls);

    // Pending work can momentarily exceed the nominal capacity (drained
    // queue plus in-flight URLs); size the rebuilt frontier to fit so
    // the restore loop cannot block with no consumer running yet.
    let capacity = FRONTIER_CAPACITY.max(state.pending_urls.len());
    let frontier = Arc::new(Frontier::with_capacity(capacity));
    for url in state.pending_urls {
        if !frontier.push(url, &cancel).await {
            job.finish_unit();
        }
    }

    log::info!("Resuming job {} ({} pending URLs)", job.id(), frontier.len());

    execute(job, frontier, events).await
}

async fn execute(
    job: Arc<CrawlJob>,
    frontier: Arc<Frontier>,
    events: EventSink,
) -> Result<CrawlSummary> {
    let config = job.config().clone();

    let fetcher = Arc::new(Fetcher::new(
        config.workers(),
        config.retries(),
        config.delay(),
        config.max_file_size(),
        config.user_agent(),
    )?);
    let filter = Arc::new(UrlFilter::from_config(&config)?);
    let pipeline = Arc::new(HandlerPipeline::with_default_handlers());

    // A resumed snapshot of a finished job has nothing to do.
    if job.outstanding() == 0 {
        job.work_done_token().cancel();
    }

    let reporter = progress::spawn_reporter(Arc::clone(&job), Arc::clone(&frontier), events.clone());

    let mut workers = Vec::with_capacity(config.workers());
    for worker_id in 0..config.workers() {
        let ctx = worker::WorkerContext {
            job: Arc::clone(&job),
            frontier: Arc::clone(&frontier),
            fetcher: Arc::clone(&fetcher),
            filter: Arc::clone(&filter),
            pipeline: Arc::clone(&pipeline),
            events: events.clone(),
        };
        workers.push(tokio::spawn(worker::run_worker(ctx, worker_id)));
    }

    for handle in workers {
        if let Err(e) = handle.await {
            log::error!("Worker task panicked: {e}");
        }
    }
    if let Err(e) = reporter.await {
        log::error!("Reporter task panicked: {e}");
    }

    write_snapshot(&job, &frontier).await?;

    let cancelled = job.is_cancelled();
    if cancelled {
        log::info!("Crawl cancelled; state saved for resume");
    } else {
        log::info!("Crawl completed");
        events.emit("✅ Download completed successfully!");
    }

    Ok(CrawlSummary {
        job_id: job.id().to_string(),
        files: job.stats.files(),
        bytes: job.stats.bytes(),
        failed: job.stats.failed(),
        skipped: job.stats.skipped(),
        duration: job.started().elapsed(),
        cancelled,
    })
}
