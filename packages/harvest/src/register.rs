//! Public register name-search client (JSON API, offset pagination).
//!
//! The register exposes a form-POST search endpoint that answers JSON
//! envelopes. Searches are partitioned by name prefix; each partition is
//! paged through with the generic [`Paginator`]. The endpoint requires
//! cookies captured from an authenticated browser session. There is no
//! programmatic login flow, so the cookie blob is externalized
//! configuration and only its presence is checked.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};
use url::Url;

use crate::error::{FetchError, FetchResult, HarvestError, Result};
use crate::extract::json::JsonExtractor;
use crate::paginate::{PageFetcher, Paginator};
use crate::record::Record;
use crate::session::{parse_cookie_blob, RetryPolicy, Session, SessionConfig};

/// Configuration for the register name search.
#[derive(Debug, Clone)]
pub struct RegisterConfig {
    /// Search endpoint, e.g. `https://host/publicregWeb/searchByNameJson`.
    pub search_url: Url,
    /// Raw `k=v; k=v` cookie blob from an authenticated browser session.
    pub cookies: String,
    /// Cookie that must be present for the blob to count as credentials.
    pub required_cookie: String,
    pub licence_status: String,
    pub licence_type: String,
    pub entity_type: String,
    pub search_language: String,
    /// Sort expression passed through verbatim.
    pub sort: String,
    /// Ordered container keys probed in the response envelope.
    pub container_keys: Vec<String>,
    pub user_agent: String,
}

impl RegisterConfig {
    pub fn new(search_url: Url, cookies: impl Into<String>) -> Self {
        Self {
            search_url,
            cookies: cookies.into(),
            required_cookie: "JSESSIONID".to_string(),
            licence_status: "active".to_string(),
            licence_type: "all".to_string(),
            entity_type: "corporation".to_string(),
            search_language: "en".to_string(),
            sort: r#"[{"property":"ceref","direction":"ASC"}]"#.to_string(),
            container_keys: JsonExtractor::default()
                .container_keys()
                .to_vec(),
            user_agent: concat!(
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 ",
                "(KHTML, like Gecko) Chrome/139.0.0.0 Safari/537.36"
            )
            .to_string(),
        }
    }

    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = entity_type.into();
        self
    }

    pub fn with_licence_status(mut self, status: impl Into<String>) -> Self {
        self.licence_status = status.into();
        self
    }
}

/// Outcome of a full register harvest across all partitions.
#[derive(Debug, Default)]
pub struct RegisterHarvest {
    pub records: Vec<Record>,
    /// Partitions whose pagination ended early, with the final error.
    pub failures: Vec<(String, FetchError)>,
}

/// Client for the register search endpoint. Implements [`PageFetcher`]
/// so the generic paginator can drive it.
pub struct RegisterClient {
    session: Session,
    config: RegisterConfig,
    extractor: JsonExtractor,
}

impl RegisterClient {
    /// Build the client. Fails fast, before any network activity, when
    /// the cookie blob is empty or lacks the required session cookie.
    pub fn new(config: RegisterConfig, retry: RetryPolicy) -> Result<Self> {
        let cookies = parse_cookie_blob(&config.cookies);
        if cookies.is_empty() {
            return Err(HarvestError::Credentials(
                "register cookie blob is empty or malformed".to_string(),
            ));
        }
        if !cookies.iter().any(|(name, _)| name == &config.required_cookie) {
            return Err(HarvestError::Credentials(format!(
                "register cookie blob lacks {}",
                config.required_cookie
            )));
        }

        let origin = config.search_url.origin().ascii_serialization();
        let origin_url: Url = origin
            .parse()
            .map_err(|_| HarvestError::Config(format!("search URL has no origin: {origin}")))?;

        let session = SessionConfig::default()
            .with_user_agent(config.user_agent.clone())
            .with_header("Accept", "*/*")
            .with_header("Origin", origin.clone())
            .with_header("Referer", origin_url.as_str())
            .with_header("X-Requested-With", "XMLHttpRequest")
            .with_cookies(config.cookies.clone(), origin_url)
            .with_retry(retry)
            .build()?;

        let extractor = JsonExtractor::new(config.container_keys.clone());
        Ok(Self {
            session,
            config,
            extractor,
        })
    }

    /// Run the paginated search over the given prefixes sequentially,
    /// sleeping `partition_delay` between prefixes. A partition that
    /// fails keeps its partial records and does not stop later ones.
    pub async fn harvest(
        &self,
        prefixes: &[String],
        paginator: &Paginator,
        partition_delay: Duration,
    ) -> RegisterHarvest {
        let mut harvest = RegisterHarvest::default();

        for (index, prefix) in prefixes.iter().enumerate() {
            let run = paginator.run(self, prefix).await;
            info!(
                prefix = %prefix,
                records = run.records.len(),
                complete = run.is_complete(),
                "prefix harvested"
            );
            harvest.records.extend(run.records);
            if let Some(error) = run.error {
                harvest.failures.push((prefix.clone(), error));
            }

            if index + 1 < prefixes.len() && !partition_delay.is_zero() {
                tokio::time::sleep(partition_delay).await;
            }
        }
        harvest
    }
}

#[async_trait]
impl PageFetcher for RegisterClient {
    async fn fetch_page(
        &self,
        partition: &str,
        offset: usize,
        limit: usize,
    ) -> FetchResult<Vec<Record>> {
        // _dc is a cache-buster, current time in milliseconds.
        let cache_buster = Utc::now().timestamp_millis();

        let form: [(&str, String); 10] = [
            ("licstatus", self.config.licence_status.clone()),
            ("lictype", self.config.licence_type.clone()),
            ("searchbyoption", "byname".to_string()),
            ("searchlang", self.config.search_language.clone()),
            ("entityType", self.config.entity_type.clone()),
            ("searchtext", partition.to_string()),
            ("page", "1".to_string()),
            ("start", offset.to_string()),
            ("limit", limit.to_string()),
            ("sort", self.config.sort.clone()),
        ];

        let request = self
            .session
            .client()
            .post(self.config.search_url.clone())
            .query(&[("_dc", cache_buster.to_string())])
            .form(&form)
            .build()
            .map_err(FetchError::Transport)?;

        let response = self.session.execute(request).await?;
        let body: serde_json::Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                // A body that is not JSON counts as a malformed page
                // shape: degrade to an empty page rather than failing
                // the partition.
                warn!(partition, offset, error = %e, "page body was not JSON");
                return Ok(Vec::new());
            }
        };

        let report = self.extractor.extract(&body);
        for skipped in &report.skipped {
            warn!(
                partition,
                offset,
                row = skipped.index,
                reason = %skipped.reason,
                "row skipped"
            );
        }
        Ok(report.records)
    }
}

/// The default partition set: one single-letter name prefix per letter.
pub fn default_prefixes() -> Vec<String> {
    ('a'..='z').map(|c| c.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(cookies: &str) -> RegisterConfig {
        RegisterConfig::new(
            "https://register.example.com/publicregWeb/searchByNameJson"
                .parse()
                .unwrap(),
            cookies,
        )
    }

    #[test]
    fn test_missing_session_cookie_is_fatal() {
        let err = RegisterClient::new(config("locale=en; theme=dark"), RetryPolicy::none())
            .err()
            .expect("client must not build without the session cookie");

        assert!(matches!(err, HarvestError::Credentials(_)));
        assert!(err.to_string().contains("JSESSIONID"));
    }

    #[test]
    fn test_empty_cookie_blob_is_fatal() {
        let err = RegisterClient::new(config("   "), RetryPolicy::none()).err().unwrap();

        assert!(matches!(err, HarvestError::Credentials(_)));
    }

    #[test]
    fn test_valid_cookie_blob_builds() {
        let client = RegisterClient::new(config("JSESSIONID=abc; locale=en"), RetryPolicy::none());

        assert!(client.is_ok());
    }

    #[test]
    fn test_default_prefixes_cover_the_alphabet() {
        let prefixes = default_prefixes();

        assert_eq!(prefixes.len(), 26);
        assert_eq!(prefixes.first().unwrap(), "a");
        assert_eq!(prefixes.last().unwrap(), "z");
    }
}
