//! Tavily-backed web searcher.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{HarvestError, Result};
use crate::searchers::domain::search_query;
use crate::security::{ExposeSecret, SecretString};
use crate::traits::searcher::{SearchResult, WebSearcher};

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

/// Web searcher over Tavily's search API.
pub struct TavilySearcher {
    api_key: SecretString,
    client: reqwest::Client,
    /// Number of results requested per query.
    pub max_results: usize,
}

impl TavilySearcher {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            client: reqwest::Client::new(),
            max_results: 10,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

#[derive(Serialize)]
struct Request<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    url: String,
    title: Option<String>,
    content: Option<String>,
}

fn search_error(e: impl std::error::Error + Send + Sync + 'static) -> HarvestError {
    HarvestError::Search(Box::new(e))
}

#[async_trait]
impl WebSearcher for TavilySearcher {
    async fn search(&self, query: &str, language: Option<&str>) -> Result<Vec<SearchResult>> {
        let query = search_query(query, language);
        let request = Request {
            query: &query,
            search_depth: "basic",
            max_results: self.max_results,
        };

        let response = self
            .client
            .post(TAVILY_SEARCH_URL)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key.expose_secret()))
            .json(&request)
            .send()
            .await
            .map_err(search_error)?;

        if !response.status().is_success() {
            return Err(search_error(std::io::Error::other(format!(
                "Tavily API error: {}",
                response.status()
            ))));
        }

        let body: Response = response.json().await.map_err(search_error)?;
        let results: Vec<SearchResult> = body
            .results
            .into_iter()
            .filter_map(|r| {
                let url = Url::parse(&r.url).ok()?;
                let mut result = SearchResult::new(url);
                if let Some(title) = r.title {
                    result = result.with_title(title);
                }
                if let Some(content) = r.content {
                    result = result.with_description(content);
                }
                Some(result)
            })
            .collect();

        debug!(query = %query, results = results.len(), "Tavily search completed");
        Ok(results)
    }
}
