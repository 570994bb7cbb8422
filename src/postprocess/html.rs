//! Streaming HTML rewriting for the post-pass.
//!
//! Every attribute in the fixed link-bearing set is rewritten against
//! the site index; `srcset` values are split and rewritten URL by URL.
//! Live-site residue (`meta refresh`, host-absolute Open-Graph metas,
//! canonical links) is removed, and configured `<script>` patterns are
//! replaced with a comment before traversal. When the streaming pass
//! rejects the input a regex fallback strips host prefixes instead.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Result, anyhow};
use lol_html::html_content::Element;
use lol_html::{HtmlRewriter, Settings, element};
use once_cell::sync::Lazy;
use regex::Regex;

use super::url_rewrite::{Rewrite, UrlRewriter};
use crate::utils::constants::LINK_ATTRIBUTES;

/// Result of one HTML rewriting pass.
pub struct HtmlOutcome {
    pub content: String,
    pub links_rewritten: u64,
    pub external: u64,
}

static SCRIPT_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").unwrap());

/// Replace `<script>` blocks matching any configured pattern with a
/// single comment node.
#[must_use]
pub fn strip_scripts(content: &str, patterns: &[Regex]) -> String {
    if patterns.is_empty() {
        return content.to_string();
    }
    SCRIPT_BLOCK_RE
        .replace_all(content, |caps: &regex::Captures| {
            let block = caps.get(0).map_or("", |m| m.as_str());
            if patterns.iter().any(|p| p.is_match(block)) {
                "<!-- script removed -->".to_string()
            } else {
                block.to_string()
            }
        })
        .into_owned()
}

/// Does an attribute value still reference the original host absolutely?
fn references_host(value: &str, host: &str) -> bool {
    value.contains(&format!("://{host}")) || value.starts_with(&format!("//{host}"))
}

/// Is a value worth running through the rewriter at all?
///
/// Meta `content` in particular carries plenty of non-URL text.
fn looks_like_link(value: &str) -> bool {
    value.starts_with('/')
        || value.starts_with("http://")
        || value.starts_with("https://")
        || value.starts_with("//")
        || value.starts_with('#')
        || !value.contains(char::is_whitespace) && value.contains('.')
}

/// Rewrite one HTML document against the site index.
///
/// # Errors
///
/// Returns an error when the streaming rewriter rejects the input; the
/// caller falls back to [`fallback_rewrite`].
pub fn process_html(
    content: &str,
    current_file: &Path,
    rewriter: &UrlRewriter,
    strip_patterns: &[Regex],
) -> Result<HtmlOutcome> {
    let source = strip_scripts(content, strip_patterns);

    let links = AtomicU64::new(0);
    let external = AtomicU64::new(0);

    let apply = |value: &str| -> Option<String> {
        match rewriter.rewrite(value, current_file) {
            Rewrite::Internal(v) => {
                links.fetch_add(1, Ordering::Relaxed);
                Some(v)
            }
            Rewrite::External(replacement) => {
                external.fetch_add(1, Ordering::Relaxed);
                replacement
            }
            Rewrite::Missing(replacement) => replacement,
            Rewrite::Skip => None,
        }
    };

    let rewrite_element = |el: &mut Element| -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let attrs: Vec<(String, String)> = el
            .attributes()
            .iter()
            .map(|a| (a.name(), a.value()))
            .collect();

        for (name, value) in attrs {
            if !LINK_ATTRIBUTES.contains(&name.as_str()) {
                continue;
            }
            let new_value = if name == "srcset" {
                rewrite_srcset(&value, &apply)
            } else {
                apply(&value)
            };
            if let Some(new_value) = new_value {
                el.set_attribute(&name, &new_value)?;
            }
        }
        Ok(())
    };

    let host = rewriter.host().to_string();
    let mut output = Vec::with_capacity(source.len());
    {
        let mut html_rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: vec![
                    element!("meta", |el| {
                        if el
                            .get_attribute("http-equiv")
                            .is_some_and(|v| v.eq_ignore_ascii_case("refresh"))
                        {
                            el.remove();
                            return Ok(());
                        }
                        let og = el
                            .get_attribute("property")
                            .or_else(|| el.get_attribute("name"))
                            .is_some_and(|v| v.starts_with("og:"));
                        if let Some(content_attr) = el.get_attribute("content") {
                            if og && references_host(&content_attr, &host) {
                                el.remove();
                                return Ok(());
                            }
                            if looks_like_link(&content_attr)
                                && let Some(new_value) = apply(&content_attr)
                            {
                                el.set_attribute("content", &new_value)?;
                            }
                        }
                        Ok(())
                    }),
                    element!("link", |el| {
                        if el
                            .get_attribute("rel")
                            .is_some_and(|v| v.eq_ignore_ascii_case("canonical"))
                        {
                            el.remove();
                            return Ok(());
                        }
                        if let Some(href) = el.get_attribute("href") {
                            if references_host(&href, &host) {
                                el.remove();
                                return Ok(());
                            }
                            if let Some(new_value) = apply(&href) {
                                el.set_attribute("href", &new_value)?;
                            }
                        }
                        Ok(())
                    }),
                    element!("*", |el| {
                        // meta and link have their own handlers above.
                        if matches!(el.tag_name().as_str(), "meta" | "link") {
                            return Ok(());
                        }
                        rewrite_element(el)
                    }),
                ],
                ..Settings::default()
            },
            |c: &[u8]| output.extend_from_slice(c),
        );

        html_rewriter
            .write(source.as_bytes())
            .map_err(|e| anyhow!("HTML rewrite error: {e}"))?;
        html_rewriter
            .end()
            .map_err(|e| anyhow!("HTML rewrite finalization error: {e}"))?;
    }

    Ok(HtmlOutcome {
        content: String::from_utf8_lossy(&output).into_owned(),
        links_rewritten: links.load(Ordering::Relaxed),
        external: external.load(Ordering::Relaxed),
    })
}

/// Rewrite each URL of a `srcset` value, descriptors preserved.
fn rewrite_srcset(value: &str, apply: &impl Fn(&str) -> Option<String>) -> Option<String> {
    let mut changed = false;
    let parts: Vec<String> = value
        .split(',')
        .map(|item| {
            let item = item.trim();
            let mut fields = item.split_whitespace();
            let url = fields.next().unwrap_or_default();
            let descriptors: Vec<&str> = fields.collect();

            let rewritten = match apply(url) {
                Some(v) => {
                    changed = true;
                    v
                }
                None => url.to_string(),
            };

            if descriptors.is_empty() {
                rewritten
            } else {
                format!("{rewritten} {}", descriptors.join(" "))
            }
        })
        .collect();

    changed.then(|| parts.join(", "))
}

/// Regex fallback used when the streaming parser rejects a document:
/// strip `https?://host` and `//host` prefixes and re-apply the
/// rewriter to the remaining path.
#[must_use]
pub fn fallback_rewrite(content: &str, current_file: &Path, rewriter: &UrlRewriter) -> (String, u64) {
    let host_re = Regex::new(&format!(
        r#"(?:https?:)?//{}(/[^\s"'<>\\)]*)?"#,
        regex::escape(rewriter.host())
    ))
    .expect("host pattern always compiles after escaping");

    let mut count = 0u64;
    let rewritten = host_re.replace_all(content, |caps: &regex::Captures| {
        let path = caps.get(1).map_or("/", |m| m.as_str());
        match rewriter.rewrite(path, current_file) {
            Rewrite::Internal(v) => {
                count += 1;
                v
            }
            _ => caps.get(0).map_or("", |m| m.as_str()).to_string(),
        }
    });

    (rewritten.into_owned(), count)
}
