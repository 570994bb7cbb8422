//! Canonicalization, scope filtering, and path mapping scenarios.

use std::path::Path;

use sitemirror::crawl_engine::UrlFilter;
use sitemirror::storage::{SaveStrategy, analyze, save_rel_path, strategy_path};
use sitemirror::utils::normalize_url;
use url::Url;

#[test]
fn normalization_scenarios() {
    assert_eq!(
        normalize_url("https://ex.com/blog/index.html?p=1#top").unwrap(),
        "https://ex.com/blog/?p=1"
    );
    assert_eq!(normalize_url("https://ex.com").unwrap(), "https://ex.com/");
}

#[test]
fn normalizer_is_idempotent_on_scenarios() {
    for raw in [
        "https://ex.com/blog/index.html?p=1#top",
        "https://ex.com",
        "https://ex.com/a/b/index.htm",
        "https://ex.com/style.css",
    ] {
        let once = normalize_url(raw).unwrap();
        assert_eq!(normalize_url(&once).unwrap(), once);
    }
}

#[test]
fn filter_scenarios() {
    let filter = UrlFilter::new("ex.com", "/blog/");
    assert!(filter.is_in_scope("https://ex.com/blog/post"));
    assert!(!filter.is_in_scope("https://ex.com/about"));
    assert!(filter.is_in_scope("https://ex.com/static/app.js"));
    assert!(!filter.is_in_scope("https://other.com/blog/x"));
}

#[test]
fn directory_index_save_path_scenario() {
    let url = Url::parse("https://ex.com/ru/chapters/1.html").unwrap();
    let path = strategy_path(Path::new("out"), &url, SaveStrategy::DirectoryIndex).unwrap();
    assert_eq!(path, Path::new("out/ex.com/ru/chapters/1/index.html"));
}

#[test]
fn file_only_save_path_scenario() {
    let url = Url::parse("https://ex.com/assets/css/style.css").unwrap();
    let path = strategy_path(Path::new("out"), &url, SaveStrategy::FileOnly).unwrap();
    assert_eq!(path, Path::new("out/ex.com/assets/css/style.css"));
}

#[test]
fn analyzer_and_mapper_agree_on_scenarios() {
    // A .html page served as text/html lands as a directory index.
    assert_eq!(
        analyze("/ru/chapters/1.html", "text/html; charset=utf-8", b"<html>"),
        SaveStrategy::DirectoryIndex
    );
    // A stylesheet is a file regardless of what the server claims.
    assert_eq!(
        analyze("/assets/css/style.css", "text/plain", b"body{}"),
        SaveStrategy::FileOnly
    );
}

#[test]
fn save_path_round_trips_through_normalizer() {
    // P = mapper(U); parse P back under the host; normalize; compare.
    for canonical in [
        "https://ex.com/",
        "https://ex.com/blog/",
        "https://ex.com/assets/app.css",
    ] {
        let url = Url::parse(canonical).unwrap();
        let rel = save_rel_path(url.path());
        let reparsed = format!("https://{}/{rel}", url.host_str().unwrap());
        assert_eq!(normalize_url(&reparsed).unwrap(), canonical, "via {rel}");
    }
}

#[test]
fn save_path_is_deterministic() {
    for path in ["/", "/blog/post", "/a/b.php", "/assets/x.css"] {
        assert_eq!(save_rel_path(path), save_rel_path(path));
    }
}
