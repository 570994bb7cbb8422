pub mod config;
pub mod crawl_engine;
pub mod fetcher;
pub mod parsers;
pub mod postprocess;
pub mod rewriter;
pub mod storage;
pub mod utils;

pub use config::{ConfigOverrides, CrawlConfig, FileConfig};
pub use crawl_engine::{
    CrawlJob, CrawlStats, CrawlSummary, EventSink, Frontier, JobState, UrlFilter, job_id,
    load_state, resume_crawl, run_crawl, state_file_path,
};
pub use fetcher::{FetchError, Fetcher};
pub use parsers::LinkParser;
pub use postprocess::{PostProcessConfig, PostProcessSummary, SiteIndex};
pub use rewriter::{
    ContentHandler, FileMetadata, HandlerPipeline, LinkRewriteHandler, rewrite_css, rewrite_html,
    rewrite_link,
};
pub use storage::{SaveStrategy, analyze, save_path, save_rel_path, strategy_path};
pub use utils::{is_fetchable_url, normalize_url};
