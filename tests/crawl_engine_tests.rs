//! End-to-end crawls against a local HTTP server.

use std::collections::HashMap;

use sitemirror::config::CrawlConfig;
use sitemirror::crawl_engine::{
    EventSink, JobState, job_id, load_state, resume_crawl, run_crawl, state_file_path,
};
use sitemirror::utils::normalize_url;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const DISCOVERY_PATHS: &[&str] = &[
    "/404",
    "/404.html",
    "/robots.txt",
    "/sitemap.xml",
    "/favicon.ico",
    "/apple-touch-icon.png",
    "/manifest.json",
];

async fn mock_discovery_404s(server: &mut mockito::Server) {
    for path in DISCOVERY_PATHS {
        server
            .mock("GET", *path)
            .with_status(404)
            .create_async()
            .await;
    }
}

#[tokio::test]
async fn crawl_mirrors_site_and_rewrites_links() {
    let mut server = mockito::Server::new_async().await;
    let url = server.url();
    mock_discovery_404s(&mut server).await;

    let root_html = format!(
        r#"<html><body>
            <a href="/page1">one</a>
            <a href="{url}/page2">two</a>
            <link rel="stylesheet" href="/assets/app.css">
            <a href="https://other.example/x">external</a>
            <a href="mailto:a@b.c">mail</a>
        </body></html>"#
    );
    let root_mock = server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(root_html)
        .expect(1)
        .create_async()
        .await;
    let page1_mock = server
        .mock("GET", "/page1")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(r#"<html><body><a href="/">home</a></body></html>"#)
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/page2")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html><body>two</body></html>")
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/assets/app.css")
        .with_status(200)
        .with_header("content-type", "text/css")
        .with_body(r#"body { background: url("/images/bg.png"); }"#)
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/images/bg.png")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body([0x89u8, b'P', b'N', b'G'].as_slice())
        .expect(1)
        .create_async()
        .await;

    let out = TempDir::new().unwrap();
    let config = CrawlConfig::builder()
        .output_dir(out.path())
        .root_url(&url)
        .workers(2)
        .max_depth(2)
        .retries(2)
        .delay_ms(1)
        .build()
        .unwrap();
    let id = job_id(config.root_url());

    let (events, mut rx) = EventSink::channel();
    let summary = run_crawl(config, events, CancellationToken::new())
        .await
        .unwrap();

    assert!(!summary.cancelled);
    assert_eq!(summary.files, 5);
    assert_eq!(summary.failed, 7, "discovery paths all 404");
    assert_eq!(summary.skipped, 0);

    // No URL is fetched twice, even though page1 links back to the root.
    root_mock.assert_async().await;
    page1_mock.assert_async().await;

    // The mirror layout follows the save strategies.
    let host_dir = out.path().join("127.0.0.1");
    let root_file = host_dir.join("index.html");
    let css_file = host_dir.join("assets/app.css");
    assert!(root_file.is_file());
    assert!(host_dir.join("page1/index.html").is_file());
    assert!(host_dir.join("page2/index.html").is_file());
    assert!(css_file.is_file());
    assert!(host_dir.join("images/bg.png").is_file());

    // Saved bytes are already browsable.
    let root_saved = std::fs::read_to_string(&root_file).unwrap();
    assert!(root_saved.contains(r#"href="page1/""#), "{root_saved}");
    assert!(root_saved.contains(r#"href="page2/""#));
    assert!(root_saved.contains(r#"href="assets/app.css""#));
    assert!(root_saved.contains(r#"href="https://other.example/x""#));
    assert!(root_saved.contains("mailto:a@b.c"));

    let css_saved = std::fs::read_to_string(&css_file).unwrap();
    assert!(css_saved.contains(r#"url("../images/bg.png")"#), "{css_saved}");

    // Final snapshot: consistent with a drained frontier.
    let state = load_state(out.path(), &id).unwrap();
    assert!(state.pending_urls.is_empty());
    assert_eq!(
        state.depth_map.get(&normalize_url(&url).unwrap()).copied(),
        Some(0)
    );

    let mut lines = Vec::new();
    while let Ok(line) = rx.try_recv() {
        lines.push(line);
    }
    assert!(lines.iter().any(|l| l.starts_with("[Done] Saved:")));
    assert!(
        lines
            .iter()
            .any(|l| l == "✅ Download completed successfully!")
    );
}

#[tokio::test]
async fn resume_fetches_exactly_the_pending_work() {
    let mut server = mockito::Server::new_async().await;
    let url = server.url();

    // The root was saved before the interruption; it must not be
    // fetched again.
    let root_mock = server
        .mock("GET", "/")
        .with_status(200)
        .expect(0)
        .create_async()
        .await;
    let page_mock = server
        .mock("GET", "/page1")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(r#"<html><body><a href="/">home</a></body></html>"#)
        .expect(1)
        .create_async()
        .await;

    let out = TempDir::new().unwrap();
    let config = CrawlConfig::builder()
        .output_dir(out.path())
        .root_url(&url)
        .workers(2)
        .max_depth(2)
        .retries(1)
        .delay_ms(1)
        .build()
        .unwrap();
    let id = job_id(config.root_url());

    let root_canonical = normalize_url(&url).unwrap();
    let pending = format!("{url}/page1");
    let state = JobState {
        id: id.clone(),
        root_url: root_canonical.clone(),
        pending_urls: vec![pending.clone()],
        depth_map: HashMap::from([(root_canonical, 0), (pending, 1)]),
        stats: HashMap::from([("totalFiles".to_string(), 1), ("bytes".to_string(), 100)]),
        config,
    };
    let state_path = state_file_path(out.path(), &id);
    std::fs::write(&state_path, serde_json::to_vec(&state).unwrap()).unwrap();

    let loaded = load_state(out.path(), &id).unwrap();
    let summary = resume_crawl(loaded, EventSink::discard(), CancellationToken::new())
        .await
        .unwrap();

    root_mock.assert_async().await;
    page_mock.assert_async().await;

    // Restored counter plus the one resumed page.
    assert_eq!(summary.files, 2);
    assert!(out.path().join("127.0.0.1/page1/index.html").is_file());

    // The fresh snapshot reflects the finished job.
    let state = load_state(out.path(), &id).unwrap();
    assert!(state.pending_urls.is_empty());
}
