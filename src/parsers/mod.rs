//! Content parsers: outbound-link discovery over fetched bytes.
//!
//! The parser set is small and closed, so it is a tagged variant chosen
//! by content-type inspection rather than a trait hierarchy. Parsers emit
//! raw resolved URLs; they never rewrite anything.

pub mod css;
pub mod html;

use url::Url;

/// Which extraction pass applies to a fetched artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkParser {
    Html,
    Css,
}

impl LinkParser {
    /// Pick a parser from the response content-type, falling back to the
    /// URL path extension when the server sent nothing useful.
    ///
    /// Returns `None` for artifacts with no outbound links to discover
    /// (images, fonts, archives).
    #[must_use]
    pub fn for_content(content_type: &str, url_path: &str) -> Option<Self> {
        let ct = content_type.to_ascii_lowercase();
        if ct.contains("text/html") || ct.contains("application/xhtml") {
            return Some(Self::Html);
        }
        if ct.contains("text/css") {
            return Some(Self::Css);
        }
        if !ct.is_empty() && !ct.contains("application/octet-stream") {
            return None;
        }

        let path = url_path.to_ascii_lowercase();
        if path.ends_with(".css") {
            Some(Self::Css)
        } else if path.ends_with(".html")
            || path.ends_with(".htm")
            || path.ends_with(".php")
            || path.ends_with('/')
        {
            Some(Self::Html)
        } else {
            None
        }
    }

    /// Extract raw outbound URLs in document order, resolved against the
    /// artifact's own URL.
    #[must_use]
    pub fn extract(&self, content: &[u8], base: &Url) -> Vec<String> {
        match self {
            Self::Html => html::extract_links(content, base),
            Self::Css => css::extract_links(content, base),
        }
    }
}
