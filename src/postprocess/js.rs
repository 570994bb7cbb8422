//! JavaScript rewriting for the post-pass.
//!
//! Deliberately narrow: only string literals that contain the original
//! host are touched. Everything else in a script is opaque.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::url_rewrite::{Rewrite, UrlRewriter};

static STRING_LITERAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"\\]*)"|'([^'\\]*)'"#).unwrap());

/// Result of one JS rewriting pass.
pub struct JsOutcome {
    pub content: String,
    pub links_rewritten: u64,
    pub external: u64,
}

/// Rewrite host-bearing string literals in a script.
#[must_use]
pub fn process_js(content: &str, current_file: &Path, rewriter: &UrlRewriter) -> JsOutcome {
    let host = rewriter.host().to_string();
    let mut links = 0u64;
    let mut external = 0u64;

    let rewritten = STRING_LITERAL_RE.replace_all(content, |caps: &Captures| {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        let (literal, quote) = if let Some(m) = caps.get(1) {
            (m.as_str(), '"')
        } else {
            (caps.get(2).map_or("", |m| m.as_str()), '\'')
        };

        if !literal.contains(&host) {
            return whole.to_string();
        }

        match rewriter.rewrite(literal, current_file) {
            Rewrite::Internal(v) => {
                links += 1;
                format!("{quote}{v}{quote}")
            }
            Rewrite::External(Some(v)) => {
                external += 1;
                format!("{quote}{v}{quote}")
            }
            Rewrite::External(None) => {
                external += 1;
                whole.to_string()
            }
            Rewrite::Missing(Some(v)) => format!("{quote}{v}{quote}"),
            Rewrite::Missing(None) | Rewrite::Skip => whole.to_string(),
        }
    });

    JsOutcome {
        content: rewritten.into_owned(),
        links_rewritten: links,
        external,
    }
}
