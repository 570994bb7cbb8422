//! Outbound-link extraction from HTML documents.
//!
//! One selector pass in document order over the attributes the mirror
//! cares about: `href` on `<a>`/`<link>`, `src` on `<img>`/`<script>`/
//! `<source>`. Values are resolved against the document's own URL; the
//! extractor never rewrites extensions — that is the rewriter's job.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use crate::utils::constants::DOMAIN_DENYLIST;
use crate::utils::is_fetchable_url;

static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a[href], link[href], img[src], script[src], source[src]").unwrap()
});

/// Extract raw outbound URLs from an HTML document, in document order.
///
/// Relative and protocol-relative references are resolved against
/// `base`. References matching the domain denylist are dropped.
#[must_use]
pub fn extract_links(content: &[u8], base: &Url) -> Vec<String> {
    let html = String::from_utf8_lossy(content);
    let document = Html::parse_document(&html);

    let mut links = Vec::new();
    for element in document.select(&LINK_SELECTOR) {
        let attr = match element.value().name() {
            "a" | "link" => "href",
            _ => "src",
        };
        let Some(value) = element.value().attr(attr) else {
            continue;
        };

        let value = value.trim();
        if !is_fetchable_url(value) {
            continue;
        }

        let Ok(resolved) = base.join(value) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }

        let resolved = resolved.to_string();
        if DOMAIN_DENYLIST.iter().any(|deny| resolved.contains(deny)) {
            continue;
        }

        links.push(resolved);
    }

    links
}
