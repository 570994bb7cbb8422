//! Fetcher behavior against a local HTTP server.

use std::time::Duration;

use sitemirror::fetcher::{FetchError, Fetcher};
use tokio_util::sync::CancellationToken;

fn fetcher(retries: u32, max_file_size: u64) -> Fetcher {
    Fetcher::new(2, retries, Duration::from_millis(1), max_file_size, "test-agent").unwrap()
}

#[tokio::test]
async fn success_returns_body_and_content_type() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/page")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body("<html>ok</html>")
        .expect(1)
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    let (body, content_type) = fetcher(3, 1024)
        .fetch(&format!("{}/page", server.url()), &cancel)
        .await
        .unwrap();

    assert_eq!(body, b"<html>ok</html>");
    assert_eq!(content_type, "text/html; charset=utf-8");
    mock.assert_async().await;
}

#[tokio::test]
async fn not_found_is_terminal_without_retry() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/gone")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    let err = fetcher(3, 1024)
        .fetch(&format!("{}/gone", server.url()), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::NotFound(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn server_error_retries_then_fails() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/flaky")
        .with_status(503)
        .expect(3)
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    let err = fetcher(3, 1024)
        .fetch(&format!("{}/flaky", server.url()), &cancel)
        .await
        .unwrap_err();

    match err {
        FetchError::Status { status, attempts, .. } => {
            assert_eq!(status, 503);
            assert_eq!(attempts, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn oversize_body_is_terminal() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/big")
        .with_status(200)
        .with_body("x".repeat(64))
        .expect(1)
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    let err = fetcher(3, 16)
        .fetch(&format!("{}/big", server.url()), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Oversize { limit: 16, .. }));
}

#[tokio::test]
async fn sends_referer_and_user_agent() {
    let mut server = mockito::Server::new_async().await;
    let host_header = server.host_with_port();
    let mock = server
        .mock("GET", "/h")
        .match_header("user-agent", "test-agent")
        .match_header("referer", format!("http://{host_header}/").as_str())
        .with_status(200)
        .with_body("ok")
        .expect(1)
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    fetcher(1, 1024)
        .fetch(&format!("{}/h", server.url()), &cancel)
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn cancelled_fetch_reports_cancellation() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/slow")
        .with_status(503)
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = fetcher(3, 1024)
        .fetch(&format!("{}/slow", server.url()), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Cancelled(_)));
}
