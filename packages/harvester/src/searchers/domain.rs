//! Search through the site search pages of known programming domains.
//!
//! No API key needed: a search URL is formed per domain and fetched
//! with the configured [`PageFetcher`]. Domains whose search page
//! returns no text are dropped from the results.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

use crate::error::Result;
use crate::traits::fetcher::PageFetcher;
use crate::traits::searcher::{SearchResult, WebSearcher};

/// Domains searched, in order.
pub const SEARCH_DOMAINS: &[&str] = &[
    "stackoverflow.com",
    "github.com",
    "dev.to",
    "medium.com/programming",
    "realpython.com",
    "javascript.info",
    "python.org/doc",
];

/// Characters of page text used as the result description.
const DESCRIPTION_CHARS: usize = 200;

/// A curated documentation site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    pub name: &'static str,
    pub url: &'static str,
}

const PYTHON_RESOURCES: &[Resource] = &[
    Resource { name: "Python Documentation", url: "https://docs.python.org/3/" },
    Resource { name: "Real Python", url: "https://realpython.com/" },
    Resource { name: "Python.org", url: "https://www.python.org/" },
];

const JAVASCRIPT_RESOURCES: &[Resource] = &[
    Resource { name: "MDN Web Docs", url: "https://developer.mozilla.org/en-US/docs/Web/JavaScript" },
    Resource { name: "JavaScript.info", url: "https://javascript.info/" },
    Resource { name: "ECMAScript Specification", url: "https://tc39.es/ecma262/" },
];

const JAVA_RESOURCES: &[Resource] = &[
    Resource { name: "Oracle Java Documentation", url: "https://docs.oracle.com/en/java/" },
    Resource { name: "Baeldung", url: "https://www.baeldung.com/" },
    Resource { name: "Java Code Geeks", url: "https://www.javacodegeeks.com/" },
];

const CPP_RESOURCES: &[Resource] = &[
    Resource { name: "CPlusPlus.com", url: "https://cplusplus.com/" },
    Resource { name: "C++ Reference", url: "https://en.cppreference.com/w/" },
    Resource { name: "ISO C++ Standard", url: "https://isocpp.org/std/the-standard" },
];

/// Curated documentation sites for a language, empty when unknown.
pub fn programming_resources(language: &str) -> &'static [Resource] {
    match language.trim().to_lowercase().as_str() {
        "python" => PYTHON_RESOURCES,
        "javascript" => JAVASCRIPT_RESOURCES,
        "java" => JAVA_RESOURCES,
        "cpp" => CPP_RESOURCES,
        _ => &[],
    }
}

/// Query text sent to each domain.
pub fn search_query(query: &str, language: Option<&str>) -> String {
    match language.map(str::trim).filter(|l| !l.is_empty()) {
        Some(language) => format!("{query} {language} programming"),
        None => query.to_string(),
    }
}

/// Site search URL for one domain.
pub fn search_url(domain: &str, query: &str) -> Option<Url> {
    let parsed = match domain {
        "stackoverflow.com" => {
            Url::parse_with_params("https://stackoverflow.com/search", &[("q", query)])
        }
        "github.com" => Url::parse_with_params(
            "https://github.com/search",
            &[("q", query), ("type", "repositories")],
        ),
        other => Url::parse_with_params(&format!("https://{other}/search"), &[("q", query)]),
    };
    parsed.ok()
}

/// Searcher over [`SEARCH_DOMAINS`].
pub struct DomainSearcher {
    fetcher: Arc<dyn PageFetcher>,
    domains: Vec<String>,
}

impl DomainSearcher {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            domains: SEARCH_DOMAINS.iter().map(|d| d.to_string()).collect(),
        }
    }

    /// Replace the searched domains.
    pub fn with_domains(mut self, domains: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.domains = domains.into_iter().map(Into::into).collect();
        self
    }
}

#[async_trait]
impl WebSearcher for DomainSearcher {
    async fn search(&self, query: &str, language: Option<&str>) -> Result<Vec<SearchResult>> {
        let query = search_query(query, language);
        let mut results = Vec::new();

        for domain in &self.domains {
            let Some(url) = search_url(domain, &query) else {
                debug!(domain = %domain, "could not form search URL");
                continue;
            };

            let Some(text) = self.fetcher.fetch_text(&url).await else {
                continue;
            };

            let snippet: String = text.chars().take(DESCRIPTION_CHARS).collect();
            results.push(
                SearchResult::new(url)
                    .with_title(format!("Results from {domain}"))
                    .with_description(format!("{snippet}...")),
            );
        }

        info!(query = %query, results = results.len(), "domain search completed");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;

    #[test]
    fn test_search_query() {
        assert_eq!(search_query("list sorting", None), "list sorting");
        assert_eq!(
            search_query("list sorting", Some("python")),
            "list sorting python programming"
        );
    }

    #[test]
    fn test_search_urls() {
        assert_eq!(
            search_url("stackoverflow.com", "async io").unwrap().as_str(),
            "https://stackoverflow.com/search?q=async+io"
        );
        assert_eq!(
            search_url("github.com", "tokio").unwrap().as_str(),
            "https://github.com/search?q=tokio&type=repositories"
        );
        assert_eq!(
            search_url("python.org/doc", "asyncio").unwrap().as_str(),
            "https://python.org/doc/search?q=asyncio"
        );
    }

    #[test]
    fn test_programming_resources() {
        assert_eq!(programming_resources("Python").len(), 3);
        assert_eq!(
            programming_resources("cpp")[1].url,
            "https://en.cppreference.com/w/"
        );
        assert!(programming_resources("cobol").is_empty());
    }

    #[tokio::test]
    async fn test_keeps_domains_that_returned_text() {
        let long_text = "x".repeat(500);
        let fetcher = MockFetcher::new()
            .with_page("https://stackoverflow.com/search?q=tokio", &long_text)
            .with_page("https://dev.to/search?q=tokio", "Short answer");
        let searcher = DomainSearcher::new(Arc::new(fetcher));

        let results = searcher.search("tokio", None).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Results from stackoverflow.com");
        assert_eq!(results[0].description.chars().count(), 203);
        assert_eq!(results[1].description, "Short answer...");
    }
}
