//! Testing utilities including mock implementations.
//!
//! These let applications exercise the harvester without network or
//! LLM calls. `MockSearcher` lives next to its trait in
//! [`crate::traits::searcher`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use url::Url;

use crate::error::{FetchError, FetchResult, GatewayError, GatewayResult};
use crate::traits::{
    fetcher::{FetchedPage, PageFetcher},
    gateway::LlmGateway,
};

pub use crate::traits::searcher::MockSearcher;

fn key(url: &str) -> String {
    Url::parse(url.trim())
        .map(String::from)
        .unwrap_or_else(|_| url.trim().to_string())
}

/// A mock page fetcher serving canned pages by URL.
///
/// Unknown URLs answer 404 unless a default text is set.
#[derive(Default)]
pub struct MockFetcher {
    pages: Arc<RwLock<HashMap<String, FetchedPage>>>,
    failures: Arc<RwLock<HashMap<String, u16>>>,
    default_text: Option<String>,
    delay: Option<Duration>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `text` for `url`.
    pub fn with_page(self, url: &str, text: &str) -> Self {
        if let Ok(parsed) = Url::parse(url) {
            self.pages
                .write()
                .unwrap()
                .insert(key(url), FetchedPage::new(parsed, text));
        }
        self
    }

    /// Serve `text` for `url`, with `html` as the markup links are found in.
    pub fn with_html_page(self, url: &str, text: &str, html: &str) -> Self {
        if let Ok(parsed) = Url::parse(url) {
            self.pages
                .write()
                .unwrap()
                .insert(key(url), FetchedPage::new(parsed, text).with_html(html));
        }
        self
    }

    /// Text served for any URL without a canned page.
    pub fn with_default_text(mut self, text: impl Into<String>) -> Self {
        self.default_text = Some(text.into());
        self
    }

    /// Make `url` answer with a server error.
    pub fn fail_url(self, url: &str) -> Self {
        self.failures.write().unwrap().insert(key(url), 500);
        self
    }

    /// Sleep before answering each fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// URLs fetched so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &Url) -> FetchResult<FetchedPage> {
        self.calls.write().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let k = key(url.as_str());
        if let Some(status) = self.failures.read().unwrap().get(&k) {
            return Err(FetchError::Status {
                url: k,
                status: *status,
            });
        }
        if let Some(page) = self.pages.read().unwrap().get(&k) {
            return Ok(page.clone());
        }
        match &self.default_text {
            Some(text) => Ok(FetchedPage::new(url.clone(), text.clone())),
            None => Err(FetchError::Status {
                url: k,
                status: 404,
            }),
        }
    }
}

/// Record of a call made to the mock gateway.
#[derive(Debug, Clone)]
pub struct MockGatewayCall {
    pub prompt: String,
    pub system_message: Option<String>,
}

/// A mock LLM gateway with scripted answers.
///
/// Scripted answers are matched by a substring of the prompt, in the
/// order they were added; the default answer covers the rest.
#[derive(Default)]
pub struct MockGateway {
    responses: Arc<RwLock<Vec<(String, String)>>>,
    default_response: Option<String>,
    always_fail: bool,
    delay: Option<Duration>,
    calls: Arc<RwLock<Vec<MockGatewayCall>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway whose every call fails.
    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Default::default()
        }
    }

    /// Answer `response` to prompts containing `needle`.
    pub fn with_response(self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses
            .write()
            .unwrap()
            .push((needle.into(), response.into()));
        self
    }

    /// Answer for prompts no scripted response matches.
    pub fn with_default_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = Some(response.into());
        self
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<MockGatewayCall> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl LlmGateway for MockGateway {
    async fn complete(&self, prompt: &str, system_message: Option<&str>) -> GatewayResult<String> {
        self.calls.write().unwrap().push(MockGatewayCall {
            prompt: prompt.to_string(),
            system_message: system_message.map(str::to_string),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.always_fail {
            return Err(GatewayError::Api {
                status: 503,
                body: "mock gateway unavailable".into(),
            });
        }

        let scripted = self
            .responses
            .read()
            .unwrap()
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, response)| response.clone());

        scripted
            .or_else(|| self.default_response.clone())
            .ok_or_else(|| GatewayError::InvalidResponse("no scripted response".into()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_fetcher_pages_and_failures() {
        let fetcher = MockFetcher::new()
            .with_page("https://a.com/ok", "hello")
            .fail_url("https://a.com/broken");

        let ok = Url::parse("https://a.com/ok").unwrap();
        let broken = Url::parse("https://a.com/broken").unwrap();
        let missing = Url::parse("https://a.com/missing").unwrap();

        assert_eq!(fetcher.fetch_text(&ok).await.as_deref(), Some("hello"));
        assert!(matches!(
            fetcher.fetch(&broken).await,
            Err(FetchError::Status { status: 500, .. })
        ));
        assert_eq!(fetcher.fetch_text(&missing).await, None);
        assert_eq!(fetcher.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_mock_fetcher_default_text() {
        let fetcher = MockFetcher::new().with_default_text("anything");
        let url = Url::parse("https://b.com/").unwrap();
        assert_eq!(fetcher.fetch_text(&url).await.as_deref(), Some("anything"));
    }

    #[tokio::test]
    async fn test_mock_gateway_scripted_responses() {
        let gateway = MockGateway::new()
            .with_response("algorithms", "[]")
            .with_default_response("{}");

        assert_eq!(gateway.complete("about algorithms", None).await.unwrap(), "[]");
        assert_eq!(
            gateway.complete("other", Some("system")).await.unwrap(),
            "{}"
        );

        let calls = gateway.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].system_message.as_deref(), Some("system"));
    }

    #[tokio::test]
    async fn test_mock_gateway_failing() {
        let gateway = MockGateway::failing().with_default_response("ignored");
        assert!(gateway.complete("x", None).await.is_err());
    }
}
