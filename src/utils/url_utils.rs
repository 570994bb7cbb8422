//! URL canonicalization and scheme gating.
//!
//! Every key in the frontier, the visited set, and the depth map is the
//! output of [`normalize_url`]; two raw links that canonicalize equal are
//! the same unit of work.

use anyhow::{Context, Result};
use url::Url;

/// Canonicalize a URL string.
///
/// Drops the fragment, supplies `/` for an empty path, and strips a
/// trailing `index.html` / `index.htm` filename (keeping the directory
/// slash, so `/blog/index.html` becomes `/blog/`). Query parameters are
/// preserved. Idempotent.
///
/// # Errors
///
/// Returns an error if the input does not parse as an absolute URL.
pub fn normalize_url(raw: &str) -> Result<String> {
    let mut url = Url::parse(raw).with_context(|| format!("invalid URL: {raw}"))?;
    url.set_fragment(None);

    if url.path().is_empty() {
        url.set_path("/");
    }

    let path = url.path().to_string();
    let lower = path.to_ascii_lowercase();
    for name in ["index.html", "index.htm"] {
        if lower.ends_with(name) {
            let head = &path[..path.len() - name.len()];
            // Only strip a whole filename segment, never a suffix of one.
            if head.is_empty() {
                url.set_path("/");
                break;
            }
            if head.ends_with('/') {
                url.set_path(head);
                break;
            }
        }
    }

    Ok(url.to_string())
}

/// Resolve a protocol-relative reference (`//host/path`) to `https:`.
///
/// Anything else is returned unchanged.
#[must_use]
pub fn resolve_protocol_relative(raw: &str) -> String {
    if raw.starts_with("//") && !raw.starts_with("///") {
        format!("https:{raw}")
    } else {
        raw.to_string()
    }
}

/// Check whether a raw reference is something the crawler could ever fetch.
///
/// Rejects empty strings, fragment-only references, and the non-http
/// pseudo-scheme family (`mailto:`, `tel:`, `javascript:`, `data:`,
/// `file:`).
#[must_use]
pub fn is_fetchable_url(raw: &str) -> bool {
    if raw.is_empty() || raw.starts_with('#') {
        return false;
    }

    let lower = raw.trim_start().to_ascii_lowercase();
    for scheme in ["mailto:", "tel:", "javascript:", "data:", "file:"] {
        if lower.starts_with(scheme) {
            return false;
        }
    }

    match Url::parse(raw) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        // Relative references are resolved against a base elsewhere.
        Err(url::ParseError::RelativeUrlWithoutBase) => true,
        Err(_) => false,
    }
}
