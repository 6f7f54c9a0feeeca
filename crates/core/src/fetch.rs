//! Content acquisition from URLs, files, and stdin.
//!
//! Remote pages and feature images are fetched through a CORS-style relay
//! that takes the target URL as a query parameter. Every request is bounded
//! by the configured timeout and retried with exponential backoff on
//! throttling, server errors and transport failures.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::{Client, Response};
use tracing::{debug, warn};
use url::Url;

use crate::{PaperfoldError, Result};

/// Relay used when none is configured.
pub const DEFAULT_RELAY_URL: &str = "https://api.allorigins.win/raw?url=";

static SHARED_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://[^\s]+").unwrap());

/// Exponential backoff policy shared by every network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each further failure.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_millis(1000) }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given zero-based failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// HTTP client configuration for fetching pages and images.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
    /// Relay prefix; the percent-encoded target URL is appended to it.
    /// An empty relay fetches the target directly.
    pub relay_url: String,
    pub retry: RetryPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: "Mozilla/5.0 (compatible; Paperfold/0.1)".to_string(),
            relay_url: DEFAULT_RELAY_URL.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl FetchConfig {
    /// Builds the URL actually requested for `target`.
    pub fn relay_target(&self, target: &str) -> String {
        if self.relay_url.is_empty() {
            return target.to_string();
        }
        let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
        format!("{}{}", self.relay_url, encoded)
    }

    pub(crate) fn client(&self) -> Result<Client> {
        Client::builder()
            .timeout(Duration::from_secs(self.timeout))
            .user_agent(self.user_agent.as_str())
            .build()
            .map_err(PaperfoldError::Http)
    }
}

/// Outcome of a single attempt inside [`with_backoff`].
#[derive(Debug)]
pub enum Attempt<T> {
    /// The attempt succeeded.
    Done(T),
    /// The attempt failed in a way worth retrying.
    Retry(PaperfoldError),
    /// The attempt failed permanently.
    Fail(PaperfoldError),
}

/// Whether an HTTP status should be retried (429 and 5xx).
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || status >= 500
}

/// Runs `op` until it succeeds, fails permanently, or the policy runs out.
///
/// The closure receives the zero-based attempt number. The error of the
/// last attempt is returned once every attempt has been used.
pub async fn with_backoff<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match op(attempt).await {
            Attempt::Done(value) => return Ok(value),
            Attempt::Fail(err) => return Err(err),
            Attempt::Retry(err) => {
                if attempt + 1 >= max_attempts {
                    return Err(err);
                }
                let delay = policy.delay_for(attempt);
                debug!(attempt = attempt + 1, delay_ms = delay.as_millis() as u64, error = %err, "retrying request");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

pub(crate) fn classify_send_error(err: reqwest::Error, timeout: u64) -> PaperfoldError {
    if err.is_timeout() { PaperfoldError::Timeout { timeout } } else { PaperfoldError::Http(err) }
}

fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| PaperfoldError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(PaperfoldError::InvalidUrl(format!(
            "unsupported scheme '{}', expected http:// or https://",
            other
        ))),
    }
}

/// GETs `url` through the relay with retries, returning the successful response.
async fn get_via_relay(url: &str, config: &FetchConfig, accept: &str) -> Result<Response> {
    let target = validate_url(url)?;
    let request_url = config.relay_target(target.as_str());
    let client = config.client()?;

    with_backoff(&config.retry, |_| {
        let request = client.get(&request_url).header("Accept", accept);
        async move {
            let response = match request.send().await {
                Ok(response) => response,
                Err(err) => return Attempt::Retry(classify_send_error(err, config.timeout)),
            };

            let status = response.status().as_u16();
            if response.status().is_success() {
                return Attempt::Done(response);
            }

            let err =
                PaperfoldError::Fetch { status: Some(status), message: format!("Failed to fetch URL (Status: {})", status) };
            if is_retryable_status(status) {
                warn!(status, "relay returned a retryable status");
                Attempt::Retry(err)
            } else {
                Attempt::Fail(err)
            }
        }
    })
    .await
}

/// Fetches the raw HTML of an article page through the relay.
pub async fn fetch_html(url: &str, config: &FetchConfig) -> Result<String> {
    let response = get_via_relay(
        url,
        config,
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    )
    .await?;
    Ok(response.text().await?)
}

/// Fetches binary content (a feature image) through the relay.
pub async fn fetch_bytes(url: &str, config: &FetchConfig) -> Result<Vec<u8>> {
    let response = get_via_relay(url, config, "image/*,*/*;q=0.8").await?;
    Ok(response.bytes().await?.to_vec())
}

/// Reads a local file as bytes.
pub fn fetch_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path_buf = PathBuf::from(path.as_ref());

    if !path_buf.exists() {
        Err(PaperfoldError::FileNotFound(path_buf))
    } else {
        fs::read(&path_buf).map_err(PaperfoldError::from)
    }
}

/// Reads HTML content from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(PaperfoldError::from)?;

    Ok(buffer)
}

/// Pulls the first `http(s)://` URL out of shared text.
///
/// Share targets often hand over "Article title https://..." rather than a
/// bare URL.
pub fn extract_shared_url(text: &str) -> Option<String> {
    SHARED_URL.find(text).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, 30);
        assert!(config.user_agent.contains("Paperfold"));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_relay_target_encodes_url() {
        let config = FetchConfig::default();
        let target = config.relay_target("https://example.com/a?b=c&d=e");
        assert_eq!(
            target,
            "https://api.allorigins.win/raw?url=https%3A%2F%2Fexample.com%2Fa%3Fb%3Dc%26d%3De"
        );
    }

    #[test]
    fn test_relay_target_direct() {
        let config = FetchConfig { relay_url: String::new(), ..Default::default() };
        assert_eq!(config.relay_target("https://example.com/"), "https://example.com/");
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(401));
    }

    #[test]
    fn test_fetch_html_invalid() {
        let config = FetchConfig::default();
        let result = std::thread::spawn(move || {
            tokio::runtime::Runtime::new()
                .unwrap()
                .block_on(fetch_html("not-a-url", &config))
        })
        .join()
        .unwrap();

        assert!(matches!(result, Err(PaperfoldError::InvalidUrl(_))));
    }

    #[test]
    fn test_fetch_html_rejects_non_http_scheme() {
        let config = FetchConfig::default();
        let result = std::thread::spawn(move || {
            tokio::runtime::Runtime::new()
                .unwrap()
                .block_on(fetch_html("ftp://example.com/file", &config))
        })
        .join()
        .unwrap();

        assert!(matches!(result, Err(PaperfoldError::InvalidUrl(_))));
    }

    #[test]
    fn test_fetch_file_not_found() {
        let result = fetch_file("/nonexistent/path/file.html");
        assert!(matches!(result, Err(PaperfoldError::FileNotFound(_))));
    }

    #[test]
    fn test_extract_shared_url() {
        assert_eq!(
            extract_shared_url("Great read https://example.com/post?id=1 via app"),
            Some("https://example.com/post?id=1".to_string())
        );
        assert_eq!(extract_shared_url("no links here"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::default();
        let start = tokio::time::Instant::now();

        let result = with_backoff(&policy, |attempt| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if attempt < 2 {
                    Attempt::Retry(PaperfoldError::Fetch { status: Some(503), message: "busy".into() })
                } else {
                    Attempt::Done("ok")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::default();

        let result: Result<()> = with_backoff(&policy, |_| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Attempt::Retry(PaperfoldError::Fetch { status: Some(429), message: "Failed to fetch URL (Status: 429)".into() })
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.unwrap_err().status(), Some(429));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_does_not_retry_permanent_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::default();

        let result: Result<()> = with_backoff(&policy, |_| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Attempt::Fail(PaperfoldError::Fetch { status: Some(404), message: "Failed to fetch URL (Status: 404)".into() })
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(PaperfoldError::Fetch { status: Some(404), .. })));
    }
}
