use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::config::Config;
use crate::error::{FetchError, OrEmpty, PipelineError, Result};

/// Field of the search payload holding the ranked entries.
pub const ORGANIC_FIELD: &str = "organic";
/// Field of an entry holding its URL.
pub const LINK_FIELD: &str = "link";

/// The search collaborator's JSON object, kept verbatim and in key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResponse(Map<String, Value>);

impl SearchResponse {
    pub fn payload(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ranked entries in upstream order. A missing or non-array field is
    /// treated as no entries.
    pub fn entries(&self) -> &[Value] {
        self.0
            .get(ORGANIC_FIELD)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The first `limit` non-empty string links, in upstream order.
    pub fn links(&self, limit: usize) -> Vec<String> {
        self.entries()
            .iter()
            .filter_map(|entry| entry.get(LINK_FIELD).and_then(Value::as_str))
            .filter(|link| !link.is_empty())
            .take(limit)
            .map(str::to_string)
            .collect()
    }
}

impl TryFrom<Value> for SearchResponse {
    type Error = FetchError;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(FetchError::Payload(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub struct SearchClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl SearchClient {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            endpoint: config.search_url.clone(),
            api_key: config.serper_api_key.clone(),
            timeout: config.search_timeout,
        }
    }

    /// One search request; any failure degrades to an empty response.
    pub async fn search(&self, query: &str) -> SearchResponse {
        self.try_search(query).await.or_empty()
    }

    pub async fn try_search(&self, query: &str) -> Result<SearchResponse> {
        self.request(query)
            .await
            .map_err(PipelineError::SearchUnavailable)
    }

    async fn request(&self, query: &str) -> std::result::Result<SearchResponse, FetchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(FetchError::NotConfigured("SERPER_API_KEY"))?;

        tracing::debug!(query, endpoint = %self.endpoint, "searching");
        let resp = self
            .http
            .post(&self.endpoint)
            .header("X-API-KEY", api_key)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .timeout(self.timeout)
            .json(&serde_json::json!({ "q": query }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body: Value = resp.json().await?;
        SearchResponse::try_from(body)
    }
}
