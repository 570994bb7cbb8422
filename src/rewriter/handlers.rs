//! Content-handler pipeline run over fetched bytes before they are saved.
//!
//! Handlers form a stable, priority-sorted chain. A handler that fails is
//! logged and skipped; the next handler receives the pre-handler bytes,
//! so one bad transformation never loses an artifact.

use std::sync::Arc;

use anyhow::Result;
use url::Url;

use crate::parsers::LinkParser;

/// Metadata describing one fetched artifact, passed to every handler.
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// Canonical URL the bytes were fetched from.
    pub url: String,
    /// Response content-type, possibly empty.
    pub content_type: String,
    /// xxh3-64 digest of the original bytes, hex-encoded. Statistics
    /// only; storage is never gated on it.
    pub digest: String,
    /// BFS depth of the artifact, root = 0.
    pub depth: u32,
}

/// One transformation over fetched bytes.
pub trait ContentHandler: Send + Sync {
    /// Stable name used in log lines.
    fn name(&self) -> &'static str;

    /// Pipeline position; lower runs earlier.
    fn priority(&self) -> u8;

    /// Transform the bytes. Errors are logged by the pipeline and leave
    /// the input flowing onward unchanged.
    fn handle(&self, content: &[u8], meta: &FileMetadata) -> Result<Vec<u8>>;
}

/// Stable priority-ascending handler chain.
pub struct HandlerPipeline {
    handlers: Vec<Arc<dyn ContentHandler>>,
}

impl HandlerPipeline {
    /// An empty pipeline; bytes pass through untouched.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// The production pipeline: link rewriting at priority 10.
    #[must_use]
    pub fn with_default_handlers() -> Self {
        let mut pipeline = Self::new();
        pipeline.register(Arc::new(LinkRewriteHandler));
        pipeline
    }

    /// Add a handler, keeping the chain priority-sorted (stable, so
    /// equal priorities keep registration order).
    pub fn register(&mut self, handler: Arc<dyn ContentHandler>) {
        self.handlers.push(handler);
        self.handlers.sort_by_key(|h| h.priority());
    }

    /// Run the chain over one artifact.
    #[must_use]
    pub fn run(&self, content: Vec<u8>, meta: &FileMetadata) -> Vec<u8> {
        let mut current = content;
        for handler in &self.handlers {
            match handler.handle(&current, meta) {
                Ok(next) => current = next,
                Err(e) => {
                    log::warn!("Handler {} failed for {}: {e}", handler.name(), meta.url);
                }
            }
        }
        current
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for HandlerPipeline {
    fn default() -> Self {
        Self::with_default_handlers()
    }
}

/// Rewrites outbound links in HTML and CSS so the saved bytes are
/// already browsable from disk.
pub struct LinkRewriteHandler;

impl ContentHandler for LinkRewriteHandler {
    fn name(&self) -> &'static str {
        "link-rewriter"
    }

    fn priority(&self) -> u8 {
        10
    }

    fn handle(&self, content: &[u8], meta: &FileMetadata) -> Result<Vec<u8>> {
        let path = Url::parse(&meta.url)
            .map(|u| u.path().to_string())
            .unwrap_or_default();

        match LinkParser::for_content(&meta.content_type, &path) {
            Some(LinkParser::Html) => super::rewrite_html(content, &meta.url),
            Some(LinkParser::Css) => Ok(super::rewrite_css(content, &meta.url)),
            None => Ok(content.to_vec()),
        }
    }
}
