//! Google Custom Search backend
//!
//! The remote dependency behind the `web_search` tool. Transient failures are
//! retried with exponential backoff and jitter; the attempt cap keeps the
//! whole retry budget inside a caller's request deadline.

use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ATTEMPTS: u32 = 3;

/// Errors from the search backend
#[derive(Debug, Error)]
pub enum SearchError {
    /// The HTTP request itself failed
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("search API returned status {0}")]
    Api(reqwest::StatusCode),

    /// Required credentials are missing
    #[error("search credentials missing: {0}")]
    Credentials(String),
}

impl SearchError {
    // Rate limits and server-side hiccups are worth another attempt;
    // everything else fails fast.
    fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api(status) => status.as_u16() == 429 || status.is_server_error(),
            Self::Credentials(_) => false,
        }
    }
}

/// A single search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Result title
    pub title: String,
    /// Result URL
    pub url: String,
    /// Short excerpt of the page
    pub snippet: String,
}

/// The remote search dependency the `web_search` tool wraps
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Search the web, returning up to `num_results` ordered hits
    async fn search(&self, query: &str, num_results: u8) -> Result<Vec<SearchHit>, SearchError>;
}

/// Search backend talking to the Google Custom Search API
#[derive(Debug)]
pub struct GoogleSearchBackend {
    http: reqwest::Client,
    api_key: String,
    cse_id: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    items: Vec<ApiItem>,
}

#[derive(Debug, Deserialize)]
struct ApiItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

impl GoogleSearchBackend {
    /// Create a backend with explicit credentials
    pub fn new(
        api_key: impl Into<String>,
        cse_id: impl Into<String>,
    ) -> Result<Self, SearchError> {
        let api_key = api_key.into();
        let cse_id = cse_id.into();
        if api_key.is_empty() || cse_id.is_empty() {
            return Err(SearchError::Credentials(
                "GOOGLE_API_KEY and GOOGLE_CSE_ID must be set in environment".to_string(),
            ));
        }

        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_key,
            cse_id,
        })
    }

    /// Create a backend from `GOOGLE_API_KEY` / `GOOGLE_CSE_ID`
    pub fn from_env() -> Result<Self, SearchError> {
        let api_key = std::env::var("GOOGLE_API_KEY").unwrap_or_default();
        let cse_id = std::env::var("GOOGLE_CSE_ID").unwrap_or_default();
        Self::new(api_key, cse_id)
    }

    async fn fetch(&self, query: &str, num_results: u8) -> Result<Vec<SearchHit>, SearchError> {
        let num = num_results.min(10).to_string();
        let response = self
            .http
            .get(SEARCH_ENDPOINT)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.cse_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Api(status));
        }

        let data: ApiResponse = response.json().await?;
        Ok(data
            .items
            .into_iter()
            .map(|item| SearchHit {
                title: item.title,
                url: item.link,
                snippet: item.snippet,
            })
            .collect())
    }
}

#[async_trait]
impl SearchBackend for GoogleSearchBackend {
    async fn search(&self, query: &str, num_results: u8) -> Result<Vec<SearchHit>, SearchError> {
        debug!(query, num_results, "querying search API");
        with_retry(|| self.fetch(query, num_results)).await
    }
}

/// Run `operation`, retrying transient failures with backoff and jitter
///
/// At most [`MAX_ATTEMPTS`] attempts; the final error is returned once the
/// attempts are exhausted or the failure is not transient.
pub(crate) async fn with_retry<F, Fut, T>(operation: F) -> Result<T, SearchError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, SearchError>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(attempt, "search succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => {
                attempt += 1;
                if !error.is_transient() || attempt >= MAX_ATTEMPTS {
                    return Err(error);
                }

                let base = Duration::from_secs(1 << (attempt - 1));
                let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=500));
                let delay = base + jitter;
                warn!(
                    attempt,
                    max_attempts = MAX_ATTEMPTS,
                    error = %error,
                    delay_secs = delay.as_secs_f64(),
                    "transient search failure, retrying"
                );
                sleep(delay).await;
            }
        }
    }
}
