//! Scrape tests against a mock Firecrawl endpoint.

use std::time::Duration;

use firecrawl_client::{FirecrawlClient, FirecrawlError};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn success_body() -> serde_json::Value {
    json!({
        "success": true,
        "data": {
            "html": "<html><body><table><tr><td>x</td></tr></table></body></html>",
            "metadata": {
                "title": "Licence counts",
                "sourceURL": "https://site.example.com/index"
            }
        }
    })
}

#[tokio::test]
async fn test_scrape_returns_document() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
        .mount(&server)
        .await;

    let client = FirecrawlClient::new("test-key").with_base_url(server.uri());

    let doc = client.scrape("https://site.example.com/index").await.unwrap();

    assert_eq!(doc.url, "https://site.example.com/index");
    assert_eq!(doc.title.as_deref(), Some("Licence counts"));
    assert!(doc.html.contains("<table>"));
}

#[tokio::test]
async fn test_rate_limited_requests_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
        .mount(&server)
        .await;

    let client = FirecrawlClient::new("test-key")
        .with_base_url(server.uri())
        .with_initial_backoff(Duration::from_millis(10));

    let doc = client.scrape("https://site.example.com/index").await.unwrap();

    assert!(doc.html.contains("<table>"));
}

#[tokio::test]
async fn test_rate_limit_retries_exhaust() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = FirecrawlClient::new("test-key")
        .with_base_url(server.uri())
        .with_max_attempts(2)
        .with_initial_backoff(Duration::from_millis(10));

    let err = client
        .scrape("https://site.example.com/index")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FirecrawlError::RateLimited { attempts: 2 }
    ));
}

#[tokio::test]
async fn test_api_failure_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(1)
        .mount(&server)
        .await;

    let client = FirecrawlClient::new("test-key").with_base_url(server.uri());

    let err = client
        .scrape("https://site.example.com/index")
        .await
        .unwrap_err();

    assert!(matches!(err, FirecrawlError::Api { status: 403, .. }));
}
