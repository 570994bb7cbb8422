// sitemirror-postprocess: rewrite a completed mirror for offline
// browsing using a full site index instead of the in-crawl two-URL view.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use sitemirror::postprocess::{self, PostProcessConfig};

#[derive(Debug, Parser)]
#[command(name = "sitemirror-postprocess", version, about)]
struct Cli {
    /// Mirror directory to process.
    #[arg(long)]
    input: PathBuf,

    /// Output directory; defaults to rewriting the mirror in place.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Host the mirror was downloaded from.
    #[arg(long)]
    host: String,

    /// Site root path the mirror was served under.
    #[arg(long, default_value = "/")]
    root: String,

    /// Worker count; defaults to twice the CPU count.
    #[arg(long)]
    workers: Option<usize>,

    /// Pass external links through instead of touching them.
    #[arg(long)]
    keep_external: bool,

    /// Replace external and unresolvable links with '#'.
    #[arg(long)]
    remove_missing: bool,

    /// Write HTML-bearing .php files with a .html extension.
    #[arg(long)]
    php_to_html: bool,

    /// Replace <script> blocks matching a regex with a comment
    /// (repeatable).
    #[arg(long = "strip-script", value_name = "PATTERN")]
    strip_scripts: Vec<String>,

    /// Log every file as it is processed.
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let mut config = PostProcessConfig::new(&cli.input, &cli.host)
        .with_root_path(&cli.root)
        .with_keep_external(cli.keep_external)
        .with_remove_missing(cli.remove_missing)
        .with_php_to_html(cli.php_to_html)
        .with_strip_scripts(&cli.strip_scripts)?;
    if let Some(output) = cli.output {
        config = config.with_output_dir(output);
    }
    if let Some(workers) = cli.workers {
        config = config.with_workers(workers);
    }

    let summary = postprocess::run(config).await?;

    log::info!(
        "{} of {} files processed, {} modified, {} links rewritten, {} external, {} failed",
        summary.processed,
        summary.total,
        summary.modified,
        summary.links_rewritten,
        summary.external,
        summary.failed,
    );

    Ok(())
}
