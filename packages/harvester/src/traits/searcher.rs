//! Web searcher trait for discovery.
//!
//! When the frontier comes up empty, the scheduler needs a way to find
//! new relevant URLs. This trait abstracts over search providers.
//!
//! ```rust,ignore
//! let results = searcher.search("python best practices", None).await?;
//! for result in results {
//!     frontier.enqueue(result.url.as_str());
//! }
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use url::Url;

use crate::error::Result;

/// A discovered URL with metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub url: Url,
    pub description: String,
}

impl SearchResult {
    /// Create a new search result from a URL.
    pub fn new(url: Url) -> Self {
        Self {
            title: String::new(),
            url,
            description: String::new(),
        }
    }

    /// Create from a URL string.
    pub fn from_url(url: &str) -> Option<Self> {
        Url::parse(url).ok().map(Self::new)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Web search for open-world discovery.
///
/// # Implementations
///
/// - `DomainSearcher` - site search pages of known programming domains
/// - `TavilySearcher` - Tavily API
/// - `MockSearcher` - for testing
#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Search for URLs relevant to the query, optionally scoped to a language.
    async fn search(&self, query: &str, language: Option<&str>) -> Result<Vec<SearchResult>>;
}

/// Mock web searcher for testing.
#[derive(Default)]
pub struct MockSearcher {
    results: RwLock<HashMap<String, Vec<SearchResult>>>,
    queries: RwLock<Vec<String>>,
}

impl MockSearcher {
    /// Create a new mock searcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add results for a query.
    pub fn with_results(self, query: &str, results: Vec<SearchResult>) -> Self {
        self.results
            .write()
            .unwrap()
            .insert(query.to_string(), results);
        self
    }

    /// Add URL strings as results.
    pub fn with_urls(self, query: &str, urls: &[&str]) -> Self {
        let results: Vec<_> = urls
            .iter()
            .filter_map(|u| SearchResult::from_url(u))
            .collect();
        self.with_results(query, results)
    }

    /// Queries received so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.read().unwrap().clone()
    }
}

#[async_trait]
impl WebSearcher for MockSearcher {
    async fn search(&self, query: &str, _language: Option<&str>) -> Result<Vec<SearchResult>> {
        self.queries.write().unwrap().push(query.to_string());
        Ok(self
            .results
            .read()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }
}
