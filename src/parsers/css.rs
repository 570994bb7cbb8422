//! Outbound-link extraction from CSS text.
//!
//! Pattern-extracts every `url(...)` operand, quoted or unquoted, and
//! resolves it against the stylesheet's own URL.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::utils::is_fetchable_url;

static CSS_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"url\(\s*(?:"([^"]*)"|'([^']*)'|([^'")\s]+))\s*\)"#).unwrap());

/// Extract raw outbound URLs from a CSS byte stream, in document order.
#[must_use]
pub fn extract_links(content: &[u8], base: &Url) -> Vec<String> {
    let css = String::from_utf8_lossy(content);

    let mut links = Vec::new();
    for caps in CSS_URL_RE.captures_iter(&css) {
        let operand = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().trim())
            .unwrap_or_default();

        if !is_fetchable_url(operand) {
            continue;
        }

        let Ok(resolved) = base.join(operand) else {
            continue;
        };
        if matches!(resolved.scheme(), "http" | "https") {
            links.push(resolved.to_string());
        }
    }

    links
}
