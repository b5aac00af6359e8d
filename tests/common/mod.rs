#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gleaner::config::Config;
use gleaner::error::{PipelineError, Result};
use gleaner::report::{Outcome, Report};
use gleaner::tokens::TokenCodec;

pub const API_KEY: &str = "test-serper-key";
pub const AUTH_HEADER: &str = "Basic dGVzdDp0ZXN0";

pub const HELLO_PAGE: &str = "<html><head><title>Greeting</title></head><body><p>Hello World</p></body></html>";

/// How the fake scrape collaborator answers for one URL.
#[derive(Debug, Clone)]
pub struct FakePage {
    status: StatusCode,
    delay: Duration,
    content: Option<String>,
}

impl FakePage {
    pub fn html(content: &str) -> Self {
        Self {
            status: StatusCode::OK,
            delay: Duration::ZERO,
            content: Some(content.to_string()),
        }
    }

    pub fn failing(status: StatusCode) -> Self {
        Self {
            status,
            delay: Duration::ZERO,
            content: None,
        }
    }

    pub fn delayed(mut self, millis: u64) -> Self {
        self.delay = Duration::from_millis(millis);
        self
    }
}

/// Fake search + scrape collaborators sharing one listener.
pub struct Upstream {
    search_status: StatusCode,
    search_delay: Duration,
    search_body: Value,
    search_plain_body: Option<String>,
    pages: HashMap<String, FakePage>,
    search_queries: Mutex<Vec<String>>,
    scrape_requests: Mutex<Vec<String>>,
    completed: Mutex<Vec<String>>,
}

impl Upstream {
    pub fn new(search_body: Value) -> Self {
        Self {
            search_status: StatusCode::OK,
            search_delay: Duration::ZERO,
            search_body,
            search_plain_body: None,
            pages: HashMap::new(),
            search_queries: Mutex::new(Vec::new()),
            scrape_requests: Mutex::new(Vec::new()),
            completed: Mutex::new(Vec::new()),
        }
    }

    pub fn search_status(mut self, status: StatusCode) -> Self {
        self.search_status = status;
        self
    }

    pub fn search_delayed(mut self, millis: u64) -> Self {
        self.search_delay = Duration::from_millis(millis);
        self
    }

    /// Answer searches with a `text/plain` body instead of JSON.
    pub fn search_plain(mut self, body: &str) -> Self {
        self.search_plain_body = Some(body.to_string());
        self
    }

    pub fn page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn searches(&self) -> Vec<String> {
        self.search_queries.lock().unwrap().clone()
    }

    pub fn scrapes(&self) -> Vec<String> {
        self.scrape_requests.lock().unwrap().clone()
    }

    /// URLs in the order their responses were sent.
    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

pub fn organic(links: &[&str]) -> Value {
    let entries: Vec<Value> = links
        .iter()
        .enumerate()
        .map(|(i, link)| {
            json!({
                "title": format!("Result {}", i + 1),
                "link": link,
                "snippet": "snippet",
                "position": i + 1,
            })
        })
        .collect();
    json!({
        "searchParameters": { "q": "query", "type": "search" },
        "organic": entries,
    })
}

async fn search(
    State(up): State<Arc<Upstream>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some(API_KEY) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "bad key" })),
        )
            .into_response();
    }
    let query = body["q"].as_str().unwrap_or_default().to_string();
    up.search_queries.lock().unwrap().push(query);

    tokio::time::sleep(up.search_delay).await;
    if let Some(plain) = &up.search_plain_body {
        return (
            up.search_status,
            [(header::CONTENT_TYPE, "text/plain")],
            plain.clone(),
        )
            .into_response();
    }
    (up.search_status, Json(up.search_body.clone())).into_response()
}

async fn scrape(
    State(up): State<Arc<Upstream>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    if header("authorization") != Some(AUTH_HEADER) || header("accept") != Some("application/json")
    {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "bad credentials" })),
        );
    }

    let url = body["url"].as_str().unwrap_or_default().to_string();
    up.scrape_requests.lock().unwrap().push(url.clone());
    let Some(page) = up.pages.get(&url).cloned() else {
        return (StatusCode::NOT_FOUND, Json(json!({})));
    };

    tokio::time::sleep(page.delay).await;
    up.completed.lock().unwrap().push(url);

    if !page.status.is_success() {
        return (page.status, Json(json!({ "message": "scrape failed" })));
    }
    (
        StatusCode::OK,
        Json(json!({ "results": [{ "content": page.content, "status_code": 200 }] })),
    )
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Serves `upstream` and returns a config pointing both collaborators at it.
pub async fn spawn(upstream: Upstream) -> (Arc<Upstream>, Config) {
    let upstream = Arc::new(upstream);
    let app = Router::new()
        .route("/search", post(search))
        .route("/v2/scrape", post(scrape))
        .with_state(upstream.clone());
    let addr = serve(app).await;

    let config = Config {
        serper_api_key: Some(API_KEY.to_string()),
        scraper_auth_header: Some(AUTH_HEADER.to_string()),
        search_url: format!("http://{addr}/search"),
        scrape_url: format!("http://{addr}/v2/scrape"),
        ..Config::default()
    };
    (upstream, config)
}

pub fn expect_report(outcome: Outcome) -> Report {
    match outcome {
        Outcome::Report(report) => report,
        Outcome::NoResults => panic!("expected a report, got no results"),
    }
}

/// One token per whitespace-separated word, drawn from a fixed table.
pub struct WordCodec {
    table: Vec<&'static str>,
}

impl WordCodec {
    pub fn new(table: &[&'static str]) -> Self {
        Self {
            table: table.to_vec(),
        }
    }
}

impl TokenCodec for WordCodec {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        text.split_whitespace()
            .map(|word| {
                self.table
                    .iter()
                    .position(|w| *w == word)
                    .map(|i| i as u32)
                    .ok_or_else(|| PipelineError::TruncationFailure(format!("unknown word {word}")))
            })
            .collect()
    }

    fn decode(&self, tokens: &[u32]) -> Result<String> {
        let words = tokens
            .iter()
            .map(|&t| {
                self.table
                    .get(t as usize)
                    .copied()
                    .ok_or_else(|| PipelineError::TruncationFailure(format!("unknown token {t}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(words.join(" "))
    }
}
