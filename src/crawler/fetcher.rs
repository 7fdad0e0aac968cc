//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - Classifying transport failures into retryable and terminal ones
//! - Retrying connection failures and read timeouts with fixed delays
//! - Turning HTTP 404 into an empty document
//!
//! The network sits behind the [`Transport`] trait so the retry logic can be
//! driven by a fake transport and tokio's paused clock in tests.

use crate::config::{CrawlerConfig, UserAgentConfig};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// A response as seen by the transport layer
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code
    pub status_code: u16,

    /// Final URL after redirects
    pub final_url: String,

    /// Response body
    pub body: String,
}

/// Failures reported by a [`Transport`]
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, connect timeout
    #[error("connection failed: {0}")]
    Connect(String),

    /// The server accepted the connection but did not answer in time
    #[error("read timed out: {0}")]
    ReadTimeout(String),

    /// Anything that will not get better by retrying
    #[error("{0}")]
    Other(String),
}

/// Terminal fetch failures surfaced to the caller
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
}

/// Issues a single GET request
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError>;
}

/// [`Transport`] backed by a reqwest client
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the transport from the crawler configuration
    pub fn from_config(
        user_agent: &UserAgentConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(
            user_agent,
            crawler.request_timeout(),
        )?))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError> {
        let response = self.client.get(url).send().await.map_err(classify)?;
        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(RawResponse {
                status_code,
                final_url,
                body: String::new(),
            });
        }

        let body = response.text().await.map_err(classify)?;
        Ok(RawResponse {
            status_code,
            final_url,
            body,
        })
    }
}

/// Maps a reqwest error onto the retry taxonomy
///
/// Connect errors are checked first: a connect timeout is a connection
/// failure, not a read timeout.
fn classify(error: reqwest::Error) -> TransportError {
    if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else if error.is_timeout() {
        TransportError::ReadTimeout(error.to_string())
    } else {
        TransportError::Other(error.to_string())
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use wordwatch::config::UserAgentConfig;
/// use wordwatch::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "Wordwatch".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(15)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fixed delays applied between retries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait after a connection failure
    pub connect_delay: Duration,

    /// Wait after a read timeout
    pub read_timeout_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            connect_delay: Duration::from_secs(5),
            read_timeout_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            connect_delay: config.connect_retry_delay(),
            read_timeout_delay: config.read_timeout_retry_delay(),
        }
    }
}

/// A fetched page
#[derive(Debug, Clone)]
pub struct Document {
    /// The URL that was requested
    pub url: String,

    /// HTTP status code of the final attempt
    pub status_code: u16,

    /// Time taken by the final attempt
    pub elapsed: Duration,

    /// Number of transient failures retried before this result
    pub retries: u32,

    /// Page body; empty for a 404
    pub body: String,
}

impl Document {
    pub fn is_not_found(&self) -> bool {
        self.status_code == StatusCode::NOT_FOUND.as_u16()
    }
}

/// Fetches documents, retrying transient failures forever
pub struct Fetcher<T> {
    transport: T,
    retry: RetryPolicy,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    /// Fetches a URL
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Connection failure | Retry after `connect_delay`, no limit |
    /// | Read timeout | Retry after `read_timeout_delay`, no limit |
    /// | HTTP 404 | Empty document |
    /// | Other HTTP status | Document with the body as served |
    /// | Other transport error | `FetchError` |
    pub async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        let mut retries = 0;

        loop {
            let started = Instant::now();
            let attempt = self.transport.get(url).await;
            let elapsed = started.elapsed();

            let delay = match attempt {
                Ok(response) => return Ok(self.finish(url, response, elapsed, retries)),
                Err(TransportError::Connect(reason)) => {
                    tracing::warn!(
                        "Connection error for {}, retry in {:?}: {}",
                        url,
                        self.retry.connect_delay,
                        reason
                    );
                    self.retry.connect_delay
                }
                Err(TransportError::ReadTimeout(reason)) => {
                    tracing::warn!(
                        "Read timeout for {}, retry in {:?}: {}",
                        url,
                        self.retry.read_timeout_delay,
                        reason
                    );
                    self.retry.read_timeout_delay
                }
                Err(TransportError::Other(message)) => {
                    return Err(FetchError::Request {
                        url: url.to_string(),
                        message,
                    });
                }
            };

            retries += 1;
            tokio::time::sleep(delay).await;
        }
    }

    fn finish(&self, url: &str, response: RawResponse, elapsed: Duration, retries: u32) -> Document {
        let not_found = response.status_code == StatusCode::NOT_FOUND.as_u16();

        if not_found {
            tracing::warn!(
                url,
                status_code = response.status_code,
                elapsed_secs = elapsed.as_secs_f64(),
                "404 Not Found, treating as empty page"
            );
        } else {
            tracing::info!(
                url,
                status_code = response.status_code,
                elapsed_secs = elapsed.as_secs_f64(),
                "Fetched page"
            );
        }

        if response.final_url != url {
            tracing::debug!("{} redirected to {}", url, response.final_url);
        }

        Document {
            url: url.to_string(),
            status_code: response.status_code,
            elapsed,
            retries,
            body: if not_found { String::new() } else { response.body },
        }
    }
}
