// sitemirror: mirror a live website to local disk for offline browsing.
//
// Two subcommands: `download <url>` starts a fresh job, `resume <job-id>`
// continues one from its state snapshot. A sitemirror.yaml in the working
// directory supplies defaults; CLI flags override it.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use sitemirror::config::{ConfigOverrides, CrawlConfig, FileConfig};
use sitemirror::crawl_engine::{self, CrawlSummary, EventSink};

#[derive(Debug, Parser)]
#[command(name = "sitemirror", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Mirror a website to disk.
    Download(DownloadArgs),
    /// Resume an interrupted job from its state file.
    Resume(ResumeArgs),
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// Number of concurrent workers.
    #[arg(long)]
    workers: Option<usize>,

    /// Maximum link depth from the root.
    #[arg(long)]
    max_depth: Option<u32>,

    /// Fetch attempts per URL.
    #[arg(long)]
    retries: Option<u32>,

    /// Base delay between retry attempts, in milliseconds.
    #[arg(long)]
    delay: Option<u64>,

    /// Per-file size cap in bytes.
    #[arg(long)]
    max_file_size: Option<u64>,

    /// Output root for the mirror.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// User-agent sent with every request.
    #[arg(long)]
    user_agent: Option<String>,
}

#[derive(Debug, Args)]
struct DownloadArgs {
    /// Root URL to mirror.
    url: String,

    #[command(flatten)]
    common: CommonArgs,

    /// Exclude URLs matching a glob pattern (repeatable).
    #[arg(long = "exclude", value_name = "PATTERN")]
    excludes: Vec<String>,
}

#[derive(Debug, Args)]
struct ResumeArgs {
    /// Job id (8 hex digits) whose state file to load.
    job_id: String,

    #[command(flatten)]
    common: CommonArgs,
}

impl CommonArgs {
    fn as_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            workers: self.workers,
            max_depth: self.max_depth,
            retries: self.retries,
            delay: self.delay,
            max_file_size: self.max_file_size,
            output_dir: self.output_dir.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let summary = match cli.command {
        Command::Download(args) => download(args).await?,
        Command::Resume(args) => resume(args).await?,
    };

    log::info!(
        "Job {}: {} files, {} bytes, {} failed, {} skipped in {:.1}s{}",
        summary.job_id,
        summary.files,
        summary.bytes,
        summary.failed,
        summary.skipped,
        summary.duration.as_secs_f64(),
        if summary.cancelled { " (cancelled)" } else { "" },
    );

    // A crawl with page failures still exits 0; only setup failures are
    // fatal, and those returned Err above.
    Ok(())
}

async fn download(args: DownloadArgs) -> Result<CrawlSummary> {
    let file = FileConfig::load_from_cwd()?.unwrap_or_default();
    let cli = args.common.as_overrides();

    let output_dir = cli
        .output_dir
        .clone()
        .or_else(|| file.output_dir.clone().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./mirror"));

    let mut builder = CrawlConfig::builder()
        .output_dir(output_dir)
        .root_url(&args.url)
        .excluded_patterns(args.excludes);
    if let Some(workers) = cli.workers.or(file.workers) {
        builder = builder.workers(workers);
    }
    if let Some(max_depth) = cli.max_depth.or(file.max_depth) {
        builder = builder.max_depth(max_depth);
    }
    if let Some(retries) = cli.retries.or(file.retries) {
        builder = builder.retries(retries);
    }
    if let Some(delay) = cli.delay.or(file.delay) {
        builder = builder.delay_ms(delay);
    }
    if let Some(max_file_size) = cli.max_file_size.or(file.max_file_size) {
        builder = builder.max_file_size(max_file_size);
    }
    if let Some(user_agent) = cli.user_agent.clone().or_else(|| file.user_agent.clone()) {
        builder = builder.user_agent(user_agent);
    }
    let config = builder.build()?;

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());
    let events = spawn_event_printer();

    crawl_engine::run_crawl(config, events, cancel).await
}

async fn resume(args: ResumeArgs) -> Result<CrawlSummary> {
    let file = FileConfig::load_from_cwd()?.unwrap_or_default();
    let cli = args.common.as_overrides();

    // The state file lives under the effective output directory.
    let output_dir = cli
        .output_dir
        .clone()
        .or_else(|| file.output_dir.clone().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./mirror"));
    let output_dir = std::path::absolute(&output_dir)?;

    let mut state = crawl_engine::load_state(&output_dir, &args.job_id)?;
    state.config.apply_overrides(&file.as_overrides())?;
    state.config.apply_overrides(&cli)?;

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());
    let events = spawn_event_printer();

    crawl_engine::resume_crawl(state, events, cancel).await
}

/// SIGINT/SIGTERM trigger the same soft cancellation an embedding
/// application would: quiesce, snapshot, exit 0.
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let mut term = match signal(SignalKind::terminate()) {
                Ok(term) => term,
                Err(e) => {
                    log::warn!("Cannot install SIGTERM handler: {e}");
                    let _ = tokio::signal::ctrl_c().await;
                    cancel.cancel();
                    return;
                }
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }

        log::info!("Shutdown signal received, finishing in-flight work");
        cancel.cancel();
    });
}

/// Drain the event channel to stdout, the way the external UI would.
fn spawn_event_printer() -> EventSink {
    let (events, mut rx) = EventSink::channel();
    tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            println!("{line}");
        }
    });
    events
}
