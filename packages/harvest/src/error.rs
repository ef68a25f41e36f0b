//! Typed errors for the harvest library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can occur over a whole harvest run.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Mandatory credentials absent or malformed. Raised before any
    /// network activity and aborts the run.
    #[error("credential error: {0}")]
    Credentials(String),

    /// Invalid configuration value (header, URL, cookie target).
    #[error("config error: {0}")]
    Config(String),

    /// A page fetch failed after the retry policy ran.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Output file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from a single page fetch, reported after the session-level
/// retry policy has absorbed its bounded retries.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Server answered with a non-success status on the final attempt.
    #[error("HTTP {status} after {attempts} attempt(s)")]
    Status { status: u16, attempts: u32 },

    /// Response body could not be decoded.
    #[error("response decode error: {0}")]
    Decode(String),

    /// An external crawl service failed to produce a document.
    #[error("crawl service error: {0}")]
    Service(String),

    /// The request body cannot be replayed for a retry.
    #[error("request body cannot be replayed")]
    UnrepeatableRequest,
}

/// Result type alias for harvest operations.
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for page fetches.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
