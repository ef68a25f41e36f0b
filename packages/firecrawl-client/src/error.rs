use thiserror::Error;

/// Errors from the Firecrawl API client.
#[derive(Debug, Error)]
pub enum FirecrawlError {
    /// `FIRECRAWL_API_KEY` is unset or empty.
    #[error("FIRECRAWL_API_KEY environment variable not set")]
    MissingApiKey,

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the API.
    #[error("Firecrawl API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Still rate limited after all retries were spent.
    #[error("rate limited after {attempts} attempt(s)")]
    RateLimited { attempts: u32 },

    /// The API reported success but returned no usable content.
    #[error("scrape returned no content for {url}")]
    EmptyDocument { url: String },
}

/// Result type alias for Firecrawl operations.
pub type Result<T> = std::result::Result<T, FirecrawlError>;
