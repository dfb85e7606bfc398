//! HTTP extractor implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - Error classification into [`ExtractionFailure`]

use super::{parse_html, Extraction, ExtractResult, ExtractionFailure, Extractor};
use crate::config::{Config, UserAgentConfig};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// Redirects follow reqwest's default policy (up to 10 hops).
///
/// # Example
///
/// ```no_run
/// use sumi_seek::config::UserAgentConfig;
/// use sumi_seek::extract::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "SumiSeek".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Extractor`] that fetches pages over HTTP and parses them with `scraper`
#[derive(Debug, Clone)]
pub struct HttpExtractor {
    client: Client,
}

impl HttpExtractor {
    /// Builds an extractor from the user agent and timeout settings
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(config.crawler.request_timeout_secs);
        let client = build_http_client(&config.user_agent, timeout)?;
        Ok(Self { client })
    }

    /// Wraps an already configured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, url: &Url) -> ExtractResult {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionFailure::Status(status.as_u16()));
        }

        // Links resolve against the final URL after redirects
        let base_url = response.url().clone();

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html(&content_type) {
            return Err(ExtractionFailure::NotHtml(content_type));
        }

        let body = response.text().await.map_err(classify_error)?;
        let parsed = parse_html(&body, &base_url);

        Ok(Extraction {
            title: parsed.title,
            description: parsed.description,
            links: parsed.links,
        })
    }
}

impl Extractor for HttpExtractor {
    async fn extract(&self, url: &Url) -> ExtractResult {
        let result = self.fetch(url).await;
        if let Err(failure) = &result {
            tracing::debug!("Extraction of {} failed: {}", url, failure);
        }
        result
    }
}

/// A missing Content-Type is given the benefit of the doubt
fn is_html(content_type: &str) -> bool {
    if content_type.is_empty() {
        return true;
    }

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    mime == "text/html" || mime == "application/xhtml+xml"
}

fn classify_error(e: reqwest::Error) -> ExtractionFailure {
    if e.is_timeout() {
        ExtractionFailure::Timeout
    } else if e.is_connect() {
        ExtractionFailure::Connect(e.to_string())
    } else {
        ExtractionFailure::Transport(e.to_string())
    }
}
