use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ScrapeRequest {
    pub url: String,
    pub formats: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeResponse {
    pub success: bool,
    pub data: Option<ScrapeData>,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeData {
    pub html: Option<String>,
    pub metadata: Option<PageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    #[serde(rename = "sourceURL")]
    pub source_url: Option<String>,
}

/// A scraped document: rendered HTML plus whatever metadata came back.
#[derive(Debug, Clone)]
pub struct Document {
    pub url: String,
    pub html: String,
    pub title: Option<String>,
}
