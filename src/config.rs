use dotenvy::dotenv;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

pub const SEARCH_URL: &str = "https://google.serper.dev/search";
pub const SCRAPER_API_URL: &str = "https://scraper-api.decodo.com/v2/scrape";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Number of search results whose pages are fetched.
pub const MAX_RESULTS: usize = 3;
pub const MAX_TOKENS_PER_PAGE: usize = 2500;
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything a request needs from the environment. Secrets are optional:
/// a missing one makes the matching collaborator return empty results.
#[derive(Debug, Clone)]
pub struct Config {
    pub serper_api_key: Option<String>,
    pub scraper_auth_header: Option<String>,
    pub search_url: String,
    pub scrape_url: String,
    pub bind_addr: SocketAddr,
    pub max_results: usize,
    pub max_tokens_per_page: usize,
    pub fetch_timeout: Duration,
    pub search_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            serper_api_key: None,
            scraper_auth_header: None,
            search_url: SEARCH_URL.to_string(),
            scrape_url: SCRAPER_API_URL.to_string(),
            bind_addr: default_bind_addr(),
            max_results: MAX_RESULTS,
            max_tokens_per_page: MAX_TOKENS_PER_PAGE,
            fetch_timeout: FETCH_TIMEOUT,
            search_timeout: SEARCH_TIMEOUT,
        }
    }
}

impl Config {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Config {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = match get("GLEANER_BIND_ADDR") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
                tracing::warn!(value = %raw, error = %e, "invalid GLEANER_BIND_ADDR, using default");
                default_bind_addr()
            }),
            None => default_bind_addr(),
        };

        Config {
            serper_api_key: get("SERPER_API_KEY"),
            scraper_auth_header: get("SCRAPER_AUTH_HEADER"),
            search_url: get_or_default(get("SERPER_SEARCH_URL"), SEARCH_URL),
            scrape_url: get_or_default(get("SCRAPER_API_URL"), SCRAPER_API_URL),
            bind_addr,
            ..Config::default()
        }
    }
}

fn get_or_default(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| default.to_string())
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}
