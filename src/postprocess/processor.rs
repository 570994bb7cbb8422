//! The post-processing run: discovery, worker fan-out, and write-out.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use anyhow::{Context, Result, ensure};
use dashmap::DashSet;
use jwalk::WalkDir;

use super::css::process_css;
use super::html::{fallback_rewrite, process_html};
use super::js::process_js;
use super::site_index::SiteIndex;
use super::stats::{PostProcessStats, PostProcessSummary};
use super::url_rewrite::UrlRewriter;
use super::PostProcessConfig;
use crate::utils::constants::PROCESSABLE_EXTENSIONS;

/// Run one post-processing pass over a completed mirror.
pub async fn run(config: PostProcessConfig) -> Result<PostProcessSummary> {
    let started = Instant::now();

    ensure!(
        config.input_dir.is_dir(),
        "input directory does not exist: {}",
        config.input_dir.display()
    );
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| {
            format!(
                "cannot create output directory {}",
                config.output_dir.display()
            )
        })?;

    // Walk 1: the site index.
    let index = {
        let input = config.input_dir.clone();
        let root = config.root_path.clone();
        let php = config.php_to_html;
        tokio::task::spawn_blocking(move || SiteIndex::build(&input, &root, php))
            .await
            .context("site index task failed")??
    };
    log::info!("Site index built: {} URLs", index.len());

    // Walk 2: split processable files from pass-through copies.
    let (queue, passthrough) = {
        let input = config.input_dir.clone();
        tokio::task::spawn_blocking(move || discover(&input))
            .await
            .context("discovery task failed")??
    };

    let stats = Arc::new(PostProcessStats::default());
    stats.set_total(queue.len() as u64);

    if config.output_dir != config.input_dir {
        for file in &passthrough {
            copy_through(&config, file).await;
        }
    }

    let config = Arc::new(config);
    let index = Arc::new(index);
    let queue = Arc::new(queue);
    let cursor = Arc::new(AtomicUsize::new(0));
    let in_progress: Arc<DashSet<PathBuf>> = Arc::new(DashSet::new());

    let mut workers = Vec::with_capacity(config.workers);
    for _ in 0..config.workers.max(1) {
        let config = Arc::clone(&config);
        let index = Arc::clone(&index);
        let queue = Arc::clone(&queue);
        let cursor = Arc::clone(&cursor);
        let in_progress = Arc::clone(&in_progress);
        let stats = Arc::clone(&stats);

        workers.push(tokio::spawn(async move {
            loop {
                let i = cursor.fetch_add(1, Ordering::Relaxed);
                let Some(file) = queue.get(i) else { break };
                if let Err(e) = process_file(&config, &index, &in_progress, &stats, file).await {
                    stats.add_failed();
                    log::warn!("Failed to process {}: {e}", file.display());
                }
            }
        }));
    }

    for handle in workers {
        if let Err(e) = handle.await {
            log::error!("Post-process worker panicked: {e}");
        }
    }

    let summary = stats.summary(started.elapsed());
    log::info!(
        "Post-processing done: {}/{} files processed, {} modified, {} links rewritten, {} external, {} failed in {:.1}s",
        summary.processed,
        summary.total,
        summary.modified,
        summary.links_rewritten,
        summary.external,
        summary.failed,
        summary.duration.as_secs_f64()
    );

    Ok(summary)
}

/// One blocking walk splitting the mirror into rewrite targets and
/// pass-through files.
fn discover(input: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut process = Vec::new();
    let mut passthrough = Vec::new();

    for entry in WalkDir::new(input).sort(true).skip_hidden(false) {
        let entry = entry.context("failed to walk mirror directory")?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if PROCESSABLE_EXTENSIONS.contains(&ext.as_str()) {
            process.push(path);
        } else {
            passthrough.push(path);
        }
    }

    Ok((process, passthrough))
}

async fn copy_through(config: &PostProcessConfig, file: &Path) {
    let Ok(rel) = file.strip_prefix(&config.input_dir) else {
        return;
    };
    let out = config.output_dir.join(rel);
    if let Some(parent) = out.parent()
        && let Err(e) = tokio::fs::create_dir_all(parent).await
    {
        log::warn!("Cannot create {}: {e}", parent.display());
        return;
    }
    if let Err(e) = tokio::fs::copy(file, &out).await {
        log::warn!("Cannot copy {} -> {}: {e}", file.display(), out.display());
    }
}

/// HTML sniff for `.php` conversion decisions.
fn looks_like_html(content: &str) -> bool {
    let head = &content[..content.len().min(2048)];
    let head = head.to_ascii_lowercase();
    ["<!doctype", "<html", "<head", "<body"]
        .iter()
        .any(|marker| head.contains(marker))
}

async fn process_file(
    config: &PostProcessConfig,
    index: &SiteIndex,
    in_progress: &DashSet<PathBuf>,
    stats: &PostProcessStats,
    file: &Path,
) -> Result<()> {
    let rel = file
        .strip_prefix(&config.input_dir)
        .context("file outside input directory")?;
    let ext = file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let raw = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let text = String::from_utf8_lossy(&raw).into_owned();

    let rewriter = UrlRewriter::new(
        index,
        &config.input_dir,
        config.host.clone(),
        config.keep_external,
        config.remove_missing,
        config.php_to_html,
    );

    let mut out_rel = rel.to_path_buf();
    let (new_content, links, external) = match ext.as_str() {
        "html" | "htm" | "xhtml" => rewrite_html_text(&text, file, &rewriter, config),
        "php" => {
            if looks_like_html(&text) {
                if config.php_to_html {
                    out_rel.set_extension("html");
                }
                rewrite_html_text(&text, file, &rewriter, config)
            } else {
                // Non-HTML PHP is opaque; copied verbatim.
                (text.clone(), 0, 0)
            }
        }
        "css" | "scss" | "less" => {
            let outcome = process_css(&text, file, &rewriter);
            (outcome.content, outcome.links_rewritten, outcome.external)
        }
        "js" => {
            let outcome = process_js(&text, file, &rewriter);
            (outcome.content, outcome.links_rewritten, outcome.external)
        }
        _ => (text.clone(), 0, 0),
    };

    let out_path = config.output_dir.join(&out_rel);
    if !in_progress.insert(out_path.clone()) {
        log::debug!("Skipping {}: output already claimed", out_path.display());
        return Ok(());
    }

    if let Some(parent) = out_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    tokio::fs::write(&out_path, new_content.as_bytes())
        .await
        .with_context(|| format!("failed to write {}", out_path.display()))?;

    stats.add_processed();
    if new_content != text {
        stats.add_modified();
    }
    stats.add_links_rewritten(links);
    stats.add_external(external);

    Ok(())
}

fn rewrite_html_text(
    text: &str,
    file: &Path,
    rewriter: &UrlRewriter,
    config: &PostProcessConfig,
) -> (String, u64, u64) {
    match process_html(text, file, rewriter, &config.strip_script_patterns) {
        Ok(outcome) => (outcome.content, outcome.links_rewritten, outcome.external),
        Err(e) => {
            log::warn!("HTML parse failed for {}, using fallback: {e}", file.display());
            let (content, links) = fallback_rewrite(text, file, rewriter);
            (content, links, 0)
        }
    }
}
