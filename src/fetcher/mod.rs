//! HTTP fetching with retries, jittered backoff, and a hard size cap.
//!
//! One `reqwest` client is shared by all workers: idle pool sized to
//! 2x the worker count, 30 s per-attempt timeout, 30 s idle-connection
//! timeout, and a redirect policy that logs and follows up to 10 hops.

use std::time::Duration;

use anyhow::{Context, Result};
use futures::StreamExt;
use rand::Rng;
use reqwest::{Client, StatusCode, header, redirect};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::utils::constants::{ACCEPT_HEADER, ACCEPT_LANGUAGE_HEADER};

/// Result type alias for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Terminal classification of a failed fetch.
///
/// The engine maps these onto its failure counters; only `NotFound` and
/// `Oversize` skip the retry loop.
#[derive(Debug, Error)]
pub enum FetchError {
    /// 404 is terminal: the page does not exist, retrying cannot help.
    #[error("not found (404): {0}")]
    NotFound(String),

    /// Non-200, non-404 status that survived the retry budget.
    #[error("HTTP status {status} after {attempts} attempts: {url}")]
    Status {
        url: String,
        status: u16,
        attempts: u32,
    },

    /// Network-level failure that survived the retry budget.
    #[error("transport error after {attempts} attempts for {url}: {message}")]
    Transport {
        url: String,
        message: String,
        attempts: u32,
    },

    /// Body exceeded the per-file cap; terminal.
    #[error("response body exceeds {limit} bytes: {url}")]
    Oversize { url: String, limit: u64 },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The job was cancelled while this fetch was in flight.
    #[error("fetch cancelled: {0}")]
    Cancelled(String),
}

/// Outcome of one attempt, before retry classification.
enum AttemptError {
    NotFound,
    Status(u16),
    Transport(String),
    Oversize,
    Cancelled,
}

/// Wrapping HTTP client used by every crawl worker.
pub struct Fetcher {
    client: Client,
    retries: u32,
    delay: Duration,
    max_file_size: u64,
}

impl Fetcher {
    /// Build the shared client.
    ///
    /// # Errors
    ///
    /// Fails only on TLS/runtime initialization problems; that is a
    /// setup failure, fatal before any worker starts.
    pub fn new(
        workers: usize,
        retries: u32,
        delay: Duration,
        max_file_size: u64,
        user_agent: &str,
    ) -> Result<Self> {
        let policy = redirect::Policy::custom(|attempt| {
            if attempt.previous().len() >= 10 {
                attempt.stop()
            } else {
                log::debug!("Following redirect to {}", attempt.url());
                attempt.follow()
            }
        });

        let client = Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(workers.saturating_mul(2).max(2))
            .redirect(policy)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            retries: retries.max(1),
            delay,
            max_file_size,
        })
    }

    /// Fetch one URL, retrying per policy.
    ///
    /// Returns the body bytes and the response content-type (possibly
    /// empty). Cancellation is observed between attempts, at request
    /// creation, and at every body chunk.
    pub async fn fetch(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> FetchResult<(Vec<u8>, String)> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        let host = parsed.host_str().unwrap_or_default();
        let referer = match parsed.port() {
            Some(port) => format!("{}://{host}:{port}/", parsed.scheme()),
            None => format!("{}://{host}/", parsed.scheme()),
        };

        let mut last: Option<FetchError> = None;
        for attempt in 1..=self.retries {
            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled(url.to_string()));
            }

            match self.attempt(&parsed, &referer, cancel).await {
                Ok(ok) => return Ok(ok),
                Err(AttemptError::NotFound) => {
                    return Err(FetchError::NotFound(url.to_string()));
                }
                Err(AttemptError::Oversize) => {
                    return Err(FetchError::Oversize {
                        url: url.to_string(),
                        limit: self.max_file_size,
                    });
                }
                Err(AttemptError::Cancelled) => {
                    return Err(FetchError::Cancelled(url.to_string()));
                }
                Err(AttemptError::Status(status)) => {
                    log::warn!("Attempt {attempt}/{}: HTTP {status} for {url}", self.retries);
                    last = Some(FetchError::Status {
                        url: url.to_string(),
                        status,
                        attempts: attempt,
                    });
                }
                Err(AttemptError::Transport(message)) => {
                    log::warn!("Attempt {attempt}/{}: {message} for {url}", self.retries);
                    last = Some(FetchError::Transport {
                        url: url.to_string(),
                        message,
                        attempts: attempt,
                    });
                }
            }

            if attempt < self.retries {
                let jitter = rand::rng().random_range(0..1000);
                let backoff = self.delay + Duration::from_millis(jitter);
                tokio::select! {
                    () = tokio::time::sleep(backoff) => {}
                    () = cancel.cancelled() => {
                        return Err(FetchError::Cancelled(url.to_string()));
                    }
                }
            }
        }

        Err(last.unwrap_or_else(|| FetchError::Transport {
            url: url.to_string(),
            message: "no attempt performed".to_string(),
            attempts: 0,
        }))
    }

    async fn attempt(
        &self,
        url: &Url,
        referer: &str,
        cancel: &CancellationToken,
    ) -> Result<(Vec<u8>, String), AttemptError> {
        let request = self
            .client
            .get(url.clone())
            .header(header::REFERER, referer)
            .header(header::ACCEPT, ACCEPT_HEADER)
            .header(header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_HEADER);

        let response = tokio::select! {
            result = request.send() => {
                result.map_err(|e| AttemptError::Transport(e.to_string()))?
            }
            () = cancel.cancelled() => return Err(AttemptError::Cancelled),
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AttemptError::NotFound);
        }
        if status != StatusCode::OK {
            return Err(AttemptError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let mut stream = response.bytes_stream();
        let mut body: Vec<u8> = Vec::new();
        loop {
            let chunk = tokio::select! {
                item = stream.next() => match item {
                    Some(Ok(chunk)) => chunk,
                    Some(Err(e)) => return Err(AttemptError::Transport(e.to_string())),
                    None => break,
                },
                () = cancel.cancelled() => return Err(AttemptError::Cancelled),
            };

            if body.len() as u64 + chunk.len() as u64 > self.max_file_size {
                return Err(AttemptError::Oversize);
            }
            body.extend_from_slice(&chunk);
        }

        Ok((body, content_type))
    }
}
