//! CSS rewriting for the post-pass: `url(...)` and `@import` targets,
//! by regex on the text — no AST.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::url_rewrite::{Rewrite, UrlRewriter};

static CSS_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"url\(\s*(?:"([^"]*)"|'([^']*)'|([^'")\s]+))\s*\)"#).unwrap());

/// `@import "x.css"` / `@import 'x.css'` without a `url()` wrapper.
static CSS_IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"@import\s+(?:"([^"]+)"|'([^']+)')"#).unwrap());

/// Result of one CSS rewriting pass.
pub struct CssOutcome {
    pub content: String,
    pub links_rewritten: u64,
    pub external: u64,
}

/// Rewrite every `url(...)` and `@import` target in a stylesheet.
#[must_use]
pub fn process_css(content: &str, current_file: &Path, rewriter: &UrlRewriter) -> CssOutcome {
    let mut links = 0u64;
    let mut external = 0u64;

    let mut apply = |operand: &str| -> Option<String> {
        match rewriter.rewrite(operand, current_file) {
            Rewrite::Internal(v) => {
                links += 1;
                Some(v)
            }
            Rewrite::External(replacement) => {
                external += 1;
                replacement
            }
            Rewrite::Missing(replacement) => replacement,
            Rewrite::Skip => None,
        }
    };

    let pass_one = CSS_URL_RE.replace_all(content, |caps: &Captures| {
        let (operand, quote) = if let Some(m) = caps.get(1) {
            (m.as_str(), "\"")
        } else if let Some(m) = caps.get(2) {
            (m.as_str(), "'")
        } else {
            (caps.get(3).map_or("", |m| m.as_str()), "")
        };
        match apply(operand) {
            Some(new_value) => format!("url({quote}{new_value}{quote})"),
            None => caps.get(0).map_or("", |m| m.as_str()).to_string(),
        }
    });

    let pass_two = CSS_IMPORT_RE.replace_all(&pass_one, |caps: &Captures| {
        let (operand, quote) = if let Some(m) = caps.get(1) {
            (m.as_str(), "\"")
        } else {
            (caps.get(2).map_or("", |m| m.as_str()), "'")
        };
        match apply(operand) {
            Some(new_value) => format!("@import {quote}{new_value}{quote}"),
            None => caps.get(0).map_or("", |m| m.as_str()).to_string(),
        }
    });

    CssOutcome {
        content: pass_two.into_owned(),
        links_rewritten: links,
        external,
    }
}
