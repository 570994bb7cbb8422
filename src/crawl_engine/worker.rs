//! The symmetric crawl worker.
//!
//! Dequeue, fetch, transform, save, discover — then hand back the
//! outstanding-work unit. A single page's failure never aborts the job.

use std::sync::Arc;

use url::Url;
use xxhash_rust::xxh3::xxh3_64;

use super::events::EventSink;
use super::frontier::Frontier;
use super::job::CrawlJob;
use super::url_filter::UrlFilter;
use crate::fetcher::{FetchError, Fetcher};
use crate::parsers::LinkParser;
use crate::rewriter::{FileMetadata, HandlerPipeline};
use crate::storage;
use crate::utils::normalize_url;

/// Everything a worker needs, cloned per task.
pub(crate) struct WorkerContext {
    pub job: Arc<CrawlJob>,
    pub frontier: Arc<Frontier>,
    pub fetcher: Arc<Fetcher>,
    pub filter: Arc<UrlFilter>,
    pub pipeline: Arc<HandlerPipeline>,
    pub events: EventSink,
}

enum Outcome {
    Done,
    Cancelled,
}

pub(crate) async fn run_worker(ctx: WorkerContext, worker_id: usize) {
    let cancel = ctx.job.cancel_token();
    let done = ctx.job.work_done_token();

    loop {
        let url = tokio::select! {
            () = cancel.cancelled() => break,
            () = done.cancelled() => break,
            popped = ctx.frontier.pop() => match popped {
                Some(url) => url,
                None => break,
            },
        };

        ctx.job.mark_in_flight(&url);
        match process_url(&ctx, &url).await {
            Outcome::Done => {
                ctx.job.clear_in_flight(&url);
                ctx.job.finish_unit();
            }
            // Leave the URL in the in-flight set so the snapshot
            // re-schedules it on resume.
            Outcome::Cancelled => break,
        }
    }

    log::debug!("Worker {worker_id} exiting");
}

async fn process_url(ctx: &WorkerContext, url: &str) -> Outcome {
    let job = &ctx.job;
    let config = job.config();
    let cancel = job.cancel_token();

    let depth = job.depth_of(url).unwrap_or(0);
    if depth > config.max_depth() {
        job.stats.add_skipped();
        return Outcome::Done;
    }

    log::info!("Processing: {url} (depth {depth})");
    ctx.events
        .emit(format!("[Info] Processing: {url} (depth {depth})"));

    let (content, content_type) = match ctx.fetcher.fetch(url, &cancel).await {
        Ok(ok) => ok,
        Err(FetchError::Cancelled(_)) => return Outcome::Cancelled,
        Err(e) => {
            job.stats.add_failed();
            log::warn!("{e}");
            ctx.events.emit(format!("[Error] {e}"));
            return Outcome::Done;
        }
    };

    let Ok(parsed) = Url::parse(url) else {
        // Frontier keys are normalizer output; this cannot happen short
        // of a corrupted state file.
        job.stats.add_failed();
        return Outcome::Done;
    };

    let digest = hex::encode(xxh3_64(&content).to_be_bytes());
    job.record_digest(&digest);

    let meta = FileMetadata {
        url: url.to_string(),
        content_type: content_type.clone(),
        digest,
        depth,
    };

    // Handlers transform a copy; link discovery below reads the
    // original bytes.
    let transformed = ctx.pipeline.run(content.clone(), &meta);

    let strategy = storage::analyze(parsed.path(), &content_type, &content);
    match storage::save_content(config.output_dir(), &parsed, strategy, &transformed).await {
        Ok(path) => {
            job.stats.add_file(transformed.len() as u64);
            log::debug!("Saved {url} -> {}", path.display());
            ctx.events.emit(format!("[Done] Saved: {url}"));
        }
        Err(e) => {
            job.stats.add_failed();
            log::warn!("Save failed for {url}: {e}");
            ctx.events.emit(format!("[Error] Save failed for {url}: {e}"));
            return Outcome::Done;
        }
    }

    if depth < config.max_depth()
        && let Some(parser) = LinkParser::for_content(&content_type, parsed.path())
    {
        for raw in parser.extract(&content, &parsed) {
            let Ok(canonical) = normalize_url(&raw) else {
                log::debug!("Dropping unparseable link: {raw}");
                continue;
            };
            if !ctx.filter.is_in_scope(&canonical) {
                continue;
            }
            if !job.admit(&canonical, depth + 1) {
                continue;
            }
            if !ctx.frontier.push(canonical, &cancel).await {
                // Cancellation won the enqueue race: give the unit back.
                job.finish_unit();
                return Outcome::Cancelled;
            }
        }
    }

    Outcome::Done
}
