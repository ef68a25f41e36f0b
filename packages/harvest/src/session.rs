//! HTTP session construction and the transient-failure retry policy.
//!
//! A session is a process-scoped `reqwest::Client` carrying identification
//! headers and a cookie jar, created once at startup and reused across all
//! partitions and pages. Requests executed through the session are retried
//! on transient failures with capped exponential backoff; the backoff
//! sleeps the single execution path rather than overlapping requests.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use tracing::warn;
use url::Url;

use crate::error::{FetchError, FetchResult, HarvestError, Result};

/// Retry policy for transient HTTP failures.
///
/// `max_attempts` counts the initial request, so the default allows four
/// retries. Backoff grows geometrically from `initial_backoff` and is
/// capped at `max_backoff`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub backoff_multiplier: f64,
    pub max_backoff: Duration,
    /// Status codes considered transient.
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(30),
            retry_statuses: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Whether a response status should trigger a retry.
    pub fn is_transient(&self, status: StatusCode) -> bool {
        self.retry_statuses.contains(&status.as_u16())
    }

    /// Backoff to sleep before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = self
            .backoff_multiplier
            .powi(retry.saturating_sub(1).min(i32::MAX as u32) as i32);
        let millis = self.initial_backoff.as_millis() as f64 * factor;
        Duration::from_millis(millis as u64).min(self.max_backoff)
    }
}

/// Configuration for building a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub user_agent: String,
    /// Extra default headers sent with every request.
    pub headers: Vec<(String, String)>,
    /// Raw `k=v; k=v` cookie blob, applied to `cookie_url`'s host.
    pub cookies: Option<String>,
    /// Host the cookie blob belongs to. Required when `cookies` is set.
    pub cookie_url: Option<Url>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (compatible; harvest/0.1)".to_string(),
            headers: Vec::new(),
            cookies: None,
            cookie_url: None,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

impl SessionConfig {
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_cookies(mut self, blob: impl Into<String>, url: Url) -> Self {
        self.cookies = Some(blob.into());
        self.cookie_url = Some(url);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Build the session: default headers, cookie jar, retry policy.
    pub fn build(self) -> Result<Session> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| HarvestError::Config(format!("invalid header name: {name}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| HarvestError::Config(format!("invalid header value for {name:?}")))?;
            headers.insert(name, value);
        }

        let jar = Arc::new(Jar::default());
        if let Some(blob) = &self.cookies {
            let url = self.cookie_url.as_ref().ok_or_else(|| {
                HarvestError::Config("cookie blob set without a cookie URL".to_string())
            })?;
            for (name, value) in parse_cookie_blob(blob) {
                jar.add_cookie_str(&format!("{name}={value}"), url);
            }
        }

        let client = reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .default_headers(headers)
            .cookie_provider(jar)
            .timeout(self.timeout)
            .build()
            .map_err(|e| HarvestError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Session {
            client,
            retry: self.retry,
        })
    }
}

/// Process-scoped HTTP handle: connection pool, cookie jar, retry policy.
pub struct Session {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl Session {
    /// The underlying client, for building requests.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Execute a request, retrying transient statuses and transport
    /// failures per the policy. Returns the successful response, or the
    /// error observed on the final attempt.
    pub async fn execute(&self, request: reqwest::Request) -> FetchResult<reqwest::Response> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let req = request
                .try_clone()
                .ok_or(FetchError::UnrepeatableRequest)?;

            match self.client.execute(req).await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    if self.retry.is_transient(status) && attempt < self.retry.max_attempts {
                        let delay = self.retry.backoff(attempt);
                        warn!(
                            %status,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "transient HTTP status, backing off"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(FetchError::Status {
                        status: status.as_u16(),
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    if is_transient_transport(&e) && attempt < self.retry.max_attempts {
                        let delay = self.retry.backoff(attempt);
                        warn!(
                            error = %e,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "transport error, backing off"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(FetchError::Transport(e));
                }
            }
        }
    }
}

fn is_transient_transport(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

/// Parse a raw `k=v; k=v` cookie blob into pairs. Malformed segments
/// (empty, or missing `=`) are dropped.
pub fn parse_cookie_blob(blob: &str) -> Vec<(String, String)> {
    blob.split(';')
        .filter_map(|part| {
            let part = part.trim();
            let (name, value) = part.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}
