//! Pure Firecrawl REST API client.
//!
//! A minimal client for the Firecrawl scrape API: fetch one URL as
//! rendered HTML, retrying rate-limited requests with doubling backoff.
//!
//! # Example
//!
//! ```rust,ignore
//! use firecrawl_client::FirecrawlClient;
//!
//! let client = FirecrawlClient::from_env()?;
//!
//! let doc = client.scrape("https://example.com").await?;
//! println!("{} bytes of HTML", doc.html.len());
//! ```

pub mod error;
pub mod types;

pub use error::{FirecrawlError, Result};
pub use types::{Document, ScrapeRequest, ScrapeResponse};

use std::time::Duration;

use types::ScrapeData;

const BASE_URL: &str = "https://api.firecrawl.dev/v1";

pub struct FirecrawlClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    max_attempts: u32,
    initial_backoff: Duration,
}

impl FirecrawlClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            max_attempts: 5,
            initial_backoff: Duration::from_secs(2),
        }
    }

    /// Create from the `FIRECRAWL_API_KEY` environment variable. Fails
    /// when it is unset or empty so a misconfigured run aborts before
    /// issuing any request.
    pub fn from_env() -> Result<Self> {
        std::env::var("FIRECRAWL_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(Self::new)
            .ok_or(FirecrawlError::MissingApiKey)
    }

    /// Override the API base URL (tests, self-hosted deployments).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Scrape one URL as rendered HTML. Rate-limited attempts back off
    /// with doubling waits; any other failure returns immediately.
    pub async fn scrape(&self, url: &str) -> Result<Document> {
        let mut backoff = self.initial_backoff;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.scrape_once(url).await {
                Err(FirecrawlError::Api { status: 429, .. }) => {
                    if attempt >= self.max_attempts {
                        return Err(FirecrawlError::RateLimited { attempts: attempt });
                    }
                    tracing::warn!(
                        url,
                        attempt,
                        wait_secs = backoff.as_secs(),
                        "rate limited, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                other => return other,
            }
        }
    }

    async fn scrape_once(&self, url: &str) -> Result<Document> {
        let request = ScrapeRequest {
            url: url.to_string(),
            formats: vec!["html".to_string()],
        };

        let response = self
            .client
            .post(format!("{}/scrape", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FirecrawlError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: ScrapeResponse = response.json().await?;
        if !parsed.success {
            return Err(FirecrawlError::Api {
                status: status.as_u16(),
                message: "scrape reported failure".to_string(),
            });
        }

        let data = parsed.data.ok_or_else(|| FirecrawlError::EmptyDocument {
            url: url.to_string(),
        })?;
        document_from_data(url, data)
    }
}

fn document_from_data(requested_url: &str, data: ScrapeData) -> Result<Document> {
    let html = data
        .html
        .filter(|html| !html.trim().is_empty())
        .ok_or_else(|| FirecrawlError::EmptyDocument {
            url: requested_url.to_string(),
        })?;

    let (url, title) = match data.metadata {
        Some(metadata) => (
            metadata
                .source_url
                .unwrap_or_else(|| requested_url.to_string()),
            metadata.title,
        ),
        None => (requested_url.to_string(), None),
    };

    Ok(Document { url, html, title })
}
