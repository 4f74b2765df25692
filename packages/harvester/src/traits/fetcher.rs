//! Page fetcher trait.
//!
//! Resolves a URL to page text. Failures are typed so callers can log
//! them, but the pipeline only ever asks "was there content?" through
//! [`PageFetcher::fetch_text`].

use async_trait::async_trait;
use tracing::warn;
use url::Url;

use crate::error::FetchResult;

/// A fetched page.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: Url,

    /// Page title if available
    pub title: Option<String>,

    /// Plain text extracted from the page
    pub text: String,

    /// Raw HTML, kept for link discovery
    pub html: Option<String>,
}

impl FetchedPage {
    /// Create a page from already-extracted text.
    pub fn new(url: Url, text: impl Into<String>) -> Self {
        Self {
            url,
            title: None,
            text: text.into(),
            html: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// The markup links should be discovered from.
    pub fn link_source(&self) -> &str {
        self.html.as_deref().unwrap_or(&self.text)
    }
}

/// Network access for the harvester.
///
/// # Implementations
///
/// - `HttpFetcher` - reqwest with regex-based text extraction
/// - `MockFetcher` - for testing
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a single page.
    async fn fetch(&self, url: &Url) -> FetchResult<FetchedPage>;

    /// Fetch a page and keep it only if it produced text.
    async fn fetch_page(&self, url: &Url) -> Option<FetchedPage> {
        match self.fetch(url).await {
            Ok(page) if !page.text.trim().is_empty() => Some(page),
            Ok(_) => {
                warn!(url = %url, "page produced no text");
                None
            }
            Err(e) => {
                warn!(url = %url, error = %e, "failed to fetch page");
                None
            }
        }
    }

    /// Page text, or `None` on any failure.
    async fn fetch_text(&self, url: &Url) -> Option<String> {
        self.fetch_page(url).await.map(|page| page.text)
    }
}
