//! Licence-count table site snapshot (HTML tables, optional form query).
//!
//! One request (GET or POST with a literal parameter map) returns a page
//! of HTML tables. When nothing parses, the page's form controls are
//! dumped as hints so an operator can set correct parameter names.

use std::str::FromStr;

use scraper::{Html, Selector};
use url::Url;

use crate::error::{FetchError, FetchResult, Result};
use crate::session::{RetryPolicy, Session, SessionConfig};

/// HTTP method for the snapshot request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            other => Err(format!("unsupported HTTP method: {other}")),
        }
    }
}

/// Configuration for one table-site snapshot.
#[derive(Debug, Clone)]
pub struct TableSiteConfig {
    pub base_url: Url,
    pub method: HttpMethod,
    /// Literal key/value request parameters (query for GET, form for POST).
    pub params: Vec<(String, String)>,
}

impl TableSiteConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            method: HttpMethod::Get,
            params: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_params(mut self, params: Vec<(String, String)>) -> Self {
        self.params = params;
        self
    }
}

/// Client for the aggregation site's table pages.
pub struct TableSiteClient {
    session: Session,
    config: TableSiteConfig,
}

impl TableSiteClient {
    pub fn new(config: TableSiteConfig, retry: RetryPolicy) -> Result<Self> {
        let session = SessionConfig::default()
            .with_header("Referer", config.base_url.as_str())
            .with_retry(retry)
            .build()?;
        Ok(Self { session, config })
    }

    /// Fetch the configured page and return its HTML body.
    pub async fn fetch_document(&self) -> FetchResult<String> {
        let client = self.session.client();
        let builder = match self.config.method {
            HttpMethod::Get => client
                .get(self.config.base_url.clone())
                .query(&self.config.params),
            HttpMethod::Post => client
                .post(self.config.base_url.clone())
                .form(&self.config.params),
        };
        let request = builder.build().map_err(FetchError::Transport)?;

        let response = self.session.execute(request).await?;
        response
            .text()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// A form control discovered on the page, with an example value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

/// Inspect the first `<form>` on the page and list its named controls:
/// every `<input>` with its value, every `<select>` with its selected (or
/// first) option's value. Empty when the page has no form.
pub fn discover_form_fields(html: &str) -> Vec<FormField> {
    let document = Html::parse_document(html);
    let form_sel = Selector::parse("form").unwrap();
    let input_sel = Selector::parse("input[name]").unwrap();
    let select_sel = Selector::parse("select[name]").unwrap();
    let selected_sel = Selector::parse("option[selected]").unwrap();
    let option_sel = Selector::parse("option").unwrap();

    let Some(form) = document.select(&form_sel).next() else {
        return Vec::new();
    };

    let mut fields = Vec::new();
    for input in form.select(&input_sel) {
        let name = input.value().attr("name").unwrap_or_default();
        if name.is_empty() {
            continue;
        }
        fields.push(FormField {
            name: name.to_string(),
            value: input.value().attr("value").unwrap_or_default().to_string(),
        });
    }
    for select in form.select(&select_sel) {
        let name = select.value().attr("name").unwrap_or_default();
        if name.is_empty() {
            continue;
        }
        let option = select
            .select(&selected_sel)
            .next()
            .or_else(|| select.select(&option_sel).next());
        let value = option
            .and_then(|o| o.value().attr("value"))
            .unwrap_or_default();
        fields.push(FormField {
            name: name.to_string(),
            value: value.to_string(),
        });
    }
    fields
}
