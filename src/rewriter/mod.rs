//! In-crawl link rewriting.
//!
//! [`rewrite_link`] is the pure core: given a link as it appears in
//! source and the URL of the page that contains it, emit a relative path
//! that resolves from the containing file's on-disk location. The
//! relative path is computed between *filesystem* paths, not URL paths,
//! because the URL→disk map is not the identity (directory-index pages,
//! php→html rewrites). The function never touches the filesystem.
//!
//! [`rewrite_html`] and [`rewrite_css`] apply the core over whole byte
//! streams, lol_html for HTML and a `url(...)` regex for CSS.

pub mod handlers;

use std::path::Path;

use anyhow::{Result, anyhow};
use lol_html::{HtmlRewriter, Settings, element};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use url::Url;

use crate::storage::save_rel_path;

pub use handlers::{ContentHandler, FileMetadata, HandlerPipeline, LinkRewriteHandler};

/// Prefixes that are never rewritten.
const OPAQUE_PREFIXES: &[&str] = &["#", "javascript:", "mailto:", "tel:", "data:", "file:"];

/// Rewrite one outbound link relative to the page that contains it.
///
/// External links, opaque schemes, and anything that fails to parse come
/// back unchanged. Query and fragment of the original are preserved.
#[must_use]
pub fn rewrite_link(original: &str, base: &str) -> String {
    if OPAQUE_PREFIXES.iter().any(|p| original.starts_with(p)) {
        return original.to_string();
    }

    let Ok(base_url) = Url::parse(base) else {
        return original.to_string();
    };
    let Ok(target) = base_url.join(original) else {
        return original.to_string();
    };

    if let (Some(target_host), Some(base_host)) = (target.host_str(), base_url.host_str())
        && target_host != base_host
    {
        return original.to_string();
    }

    // Both endpoints mapped to their on-disk locations, host omitted.
    let base_disk = save_rel_path(base_url.path());
    let target_disk = save_rel_path(target.path());

    let base_dir = Path::new(&base_disk).parent().unwrap_or_else(|| Path::new(""));
    let Some(diff) = pathdiff::diff_paths(Path::new(&target_disk), base_dir) else {
        return original.to_string();
    };

    let mut rel = diff.to_string_lossy().replace('\\', "/");
    if rel == "index.html" {
        rel = "./".to_string();
    } else if rel.ends_with("/index.html") {
        rel.truncate(rel.len() - "index.html".len());
    }

    if let Some(query) = target.query() {
        rel.push('?');
        rel.push_str(query);
    }
    if let Some(fragment) = target.fragment() {
        rel.push('#');
        rel.push_str(fragment);
    }

    rel
}

/// Rewrite every crawl-relevant link attribute in an HTML document.
///
/// # Errors
///
/// Returns an error when the streaming rewriter rejects the input; the
/// caller keeps the original bytes in that case.
pub fn rewrite_html(content: &[u8], base_url: &str) -> Result<Vec<u8>> {
    fn rewrite_attr(
        el: &mut lol_html::html_content::Element,
        attr: &str,
        base: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(value) = el.get_attribute(attr) {
            let rewritten = rewrite_link(&value, base);
            if rewritten != value {
                el.set_attribute(attr, &rewritten)?;
            }
        }
        Ok(())
    }

    let mut output = Vec::with_capacity(content.len());
    let base = base_url;

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!("a[href]", |el| rewrite_attr(el, "href", base)),
                element!("link[href]", |el| rewrite_attr(el, "href", base)),
                element!("img[src]", |el| rewrite_attr(el, "src", base)),
                element!("script[src]", |el| rewrite_attr(el, "src", base)),
                element!("source[src]", |el| rewrite_attr(el, "src", base)),
            ],
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter
        .write(content)
        .map_err(|e| anyhow!("HTML rewrite error: {e}"))?;
    rewriter
        .end()
        .map_err(|e| anyhow!("HTML rewrite finalization error: {e}"))?;

    Ok(output)
}

static CSS_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"url\(\s*(?:"([^"]*)"|'([^']*)'|([^'")\s]+))\s*\)"#).unwrap());

/// Rewrite every `url(...)` operand in a CSS byte stream.
#[must_use]
pub fn rewrite_css(content: &[u8], base_url: &str) -> Vec<u8> {
    let css = String::from_utf8_lossy(content);

    let rewritten = CSS_URL_RE.replace_all(&css, |caps: &Captures| {
        let (operand, quote) = if let Some(m) = caps.get(1) {
            (m.as_str(), "\"")
        } else if let Some(m) = caps.get(2) {
            (m.as_str(), "'")
        } else {
            (caps.get(3).map_or("", |m| m.as_str()), "")
        };
        let new = rewrite_link(operand, base_url);
        format!("url({quote}{new}{quote})")
    });

    rewritten.into_owned().into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://ex.com/ru/chapters/1/";

    #[test]
    fn sibling_directory_page() {
        assert_eq!(rewrite_link("/ru/chapters/2/", BASE), "../2/");
    }

    #[test]
    fn site_rooted_asset() {
        assert_eq!(
            rewrite_link("/assets/css/a.css", BASE),
            "../../../assets/css/a.css"
        );
    }

    #[test]
    fn external_link_untouched() {
        assert_eq!(rewrite_link("https://other.com/x", BASE), "https://other.com/x");
    }

    #[test]
    fn opaque_prefixes_untouched() {
        for link in ["#top", "javascript:void(0)", "mailto:a@b.c", "tel:+1", "data:,x", "file:///etc"] {
            assert_eq!(rewrite_link(link, BASE), link);
        }
    }

    #[test]
    fn query_and_fragment_preserved() {
        assert_eq!(
            rewrite_link("/ru/chapters/2/?page=3#anchor", BASE),
            "../2/?page=3#anchor"
        );
    }

    #[test]
    fn php_target_points_at_html() {
        assert_eq!(rewrite_link("/shop/cart.php", "https://ex.com/"), "shop/cart.html");
    }

    #[test]
    fn same_page_link_collapses_to_dot() {
        assert_eq!(rewrite_link("/ru/chapters/1/", BASE), "./");
    }

    #[test]
    fn html_attributes_rewritten() {
        let html = br#"<a href="/ru/chapters/2/">next</a><img src="/assets/i.png">"#;
        let out = rewrite_html(html, BASE).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains(r#"href="../2/""#));
        assert!(out.contains(r#"src="../../../assets/i.png""#));
    }

    #[test]
    fn external_attribute_untouched() {
        let html = br#"<a href="https://other.com/x" class="btn">x</a>"#;
        let out = rewrite_html(html, BASE).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains(r#"href="https://other.com/x""#));
        assert!(out.contains(r#"class="btn""#));
    }

    #[test]
    fn css_urls_rewritten_with_quoting_kept() {
        let css = br#"body { background: url("/img/bg.png") } .x { src: url(a.woff) }"#;
        let out = rewrite_css(css, "https://ex.com/css/site.css");
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains(r#"url("../img/bg.png")"#));
        assert!(out.contains("url(a.woff)"));
    }
}
