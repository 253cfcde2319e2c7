//! Game catalog client.
//!
//! # Data Flow
//! ```text
//! GET /api/discover | /api/search | /api/game/{id}
//!     → GameCatalog (API key check)
//!     → GameApi breaker → reqwest GET {base_url}/games[...]
//!     → upstream JSON returned untouched
//! ```
//!
//! When the breaker opens, the search, catalog and analytics flags are
//! switched off so the frontend hides those pages. Only transport errors and
//! 5xx answers count against the breaker; an upstream 4xx is returned to the
//! caller as a rejected request.

use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::CatalogConfig;
use crate::resilience::{CircuitBreaker, ResilienceError};

/// Environment variable read when the config carries no API key.
pub const API_KEY_ENV: &str = "EXTERNAL_API_KEY";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("missing catalog API key (set catalog.api_key or {env})", env = API_KEY_ENV)]
    MissingApiKey,

    #[error("invalid catalog url: {0}")]
    Url(#[from] url::ParseError),

    #[error("game not found")]
    NotFound,

    #[error("catalog rejected the request with {status}")]
    Rejected { status: u16 },

    #[error(transparent)]
    Unavailable(#[from] ResilienceError),
}

/// Page selection for list queries. Zero falls back to the defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

pub struct GameCatalog {
    client: Client,
    base: Url,
    api_key: Option<String>,
    default_page_size: u32,
    breaker: Arc<CircuitBreaker>,
}

impl GameCatalog {
    pub fn new(config: &CatalogConfig, breaker: Arc<CircuitBreaker>) -> Result<Self, CatalogError> {
        let api_key = Some(config.api_key.clone())
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()));

        let base = Url::parse(&config.base_url)?;

        Ok(Self {
            client: Client::new(),
            base,
            api_key,
            default_page_size: config.default_page_size,
            breaker,
        })
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Popular games, most added first.
    pub async fn discover(&self, page: Page) -> Result<Value, CatalogError> {
        let (page, page_size) = self.paging(page);
        let url = self.url(
            &["games"],
            &[("ordering", "-added".into()), ("page", page), ("page_size", page_size)],
        )?;
        self.fetch(url).await
    }

    pub async fn search(&self, query: &str, page: Page) -> Result<Value, CatalogError> {
        let (page, page_size) = self.paging(page);
        let url = self.url(
            &["games"],
            &[("search", query.to_string()), ("page_size", page_size), ("page", page)],
        )?;
        self.fetch(url).await
    }

    /// Full details for one game; `id` may be a numeric id or a slug.
    pub async fn game(&self, id: &str) -> Result<Value, CatalogError> {
        let url = self.url(&["games", id], &[])?;
        self.fetch(url).await
    }

    fn paging(&self, page: Page) -> (String, String) {
        let number = if page.page == 0 { 1 } else { page.page };
        let size = if page.page_size == 0 { self.default_page_size } else { page.page_size };
        (number.to_string(), size.to_string())
    }

    fn url(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, CatalogError> {
        let key = self.api_key.as_deref().ok_or(CatalogError::MissingApiKey)?;
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("key", key);
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    async fn fetch(&self, url: Url) -> Result<Value, CatalogError> {
        let client = &self.client;
        let url = &url;
        match self.breaker.execute(move || get_json(client, url.clone())).await? {
            Ok(value) => Ok(value),
            Err(StatusCode::NOT_FOUND) => Err(CatalogError::NotFound),
            Err(status) => Err(CatalogError::Rejected { status: status.as_u16() }),
        }
    }
}

/// The outer error fails the breaker; the inner one is a rejected request.
async fn get_json(client: &Client, url: Url) -> Result<Result<Value, StatusCode>, reqwest::Error> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if is_rejection(status) {
        return Ok(Err(status));
    }
    Ok(Ok(response.error_for_status()?.json().await?))
}

/// 4xx answers other than timeouts and rate limits.
fn is_rejection(status: StatusCode) -> bool {
    status.is_client_error()
        && status != StatusCode::REQUEST_TIMEOUT
        && status != StatusCode::TOO_MANY_REQUESTS
}
