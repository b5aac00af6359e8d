use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::Config;
use crate::error::{FetchError, OrEmpty, PipelineError, Result};

/// Only the first element of `results` is interpreted; the rest are left
/// as raw JSON so an odd trailing entry cannot spoil the page.
#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ScrapeResult {
    #[serde(default)]
    content: Option<String>,
}

impl ScrapeResponse {
    fn into_content(self) -> std::result::Result<String, FetchError> {
        let first = self
            .results
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::Payload("scrape response has no results".to_string()))?;
        let first: ScrapeResult = serde_json::from_value(first)
            .map_err(|e| FetchError::Payload(format!("first scrape result: {e}")))?;
        Ok(first.content.unwrap_or_default())
    }
}

/// Retrieves raw page markup through the scrape collaborator.
pub struct PageFetcher {
    http: reqwest::Client,
    endpoint: String,
    auth_header: Option<String>,
    timeout: Duration,
}

impl PageFetcher {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            endpoint: config.scrape_url.clone(),
            auth_header: config.scraper_auth_header.clone(),
            timeout: config.fetch_timeout,
        }
    }

    /// Markup for `url`, or an empty string if anything goes wrong.
    pub async fn fetch(&self, url: &str) -> String {
        self.try_fetch(url).await.or_empty()
    }

    pub async fn try_fetch(&self, url: &str) -> Result<String> {
        self.request(url)
            .await
            .map_err(|source| PipelineError::FetchUnavailable {
                url: url.to_string(),
                source,
            })
    }

    async fn request(&self, url: &str) -> std::result::Result<String, FetchError> {
        let auth = self
            .auth_header
            .as_deref()
            .ok_or(FetchError::NotConfigured("SCRAPER_AUTH_HEADER"))?;

        tracing::debug!(url, "fetching page");
        let resp = self
            .http
            .post(&self.endpoint)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(AUTHORIZATION, auth)
            .timeout(self.timeout)
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let parsed: ScrapeResponse = resp.json().await?;
        parsed.into_content()
    }
}
