//! The harvester: frontier, extractor, store and link discovery bundled
//! into one shared handle.
//!
//! One `Harvester` is built at startup and shared behind an `Arc`
//! between the learning scheduler and request handlers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use crate::frontier::{parse_valid_url, Frontier};
use crate::pipeline::extract::Extractor;
use crate::pipeline::links::LinkDiscoverer;
use crate::searchers::domain::programming_resources;
use crate::stores::KnowledgeStore;
use crate::traits::{fetcher::PageFetcher, gateway::LlmGateway, searcher::WebSearcher};
use crate::types::candidate::Extracted;
use crate::types::config::HarvesterConfig;
use crate::types::knowledge::KnowledgeHit;
use crate::types::status::{LearningStatus, ProcessReport, UrlOutcome};

/// Shared harvester state and the operations exposed to callers.
pub struct Harvester {
    config: HarvesterConfig,
    frontier: Arc<Frontier>,
    store: KnowledgeStore,
    extractor: Extractor,
    links: LinkDiscoverer,
    fetcher: Arc<dyn PageFetcher>,
    searcher: Arc<dyn WebSearcher>,
    is_learning: AtomicBool,
}

/// Marks a learning cycle in progress; clears the flag on drop.
pub struct LearningGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for LearningGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl Harvester {
    /// Build a harvester, loading the knowledge base from `config.knowledge_file`.
    ///
    /// Without a gateway every page goes through fallback extraction.
    pub fn new(
        config: HarvesterConfig,
        fetcher: Arc<dyn PageFetcher>,
        searcher: Arc<dyn WebSearcher>,
        gateway: Option<Arc<dyn LlmGateway>>,
    ) -> Self {
        let store = KnowledgeStore::open(&config.knowledge_file);
        Self::with_store(config, store, fetcher, searcher, gateway)
    }

    /// Build a harvester around an already opened store.
    pub fn with_store(
        config: HarvesterConfig,
        store: KnowledgeStore,
        fetcher: Arc<dyn PageFetcher>,
        searcher: Arc<dyn WebSearcher>,
        gateway: Option<Arc<dyn LlmGateway>>,
    ) -> Self {
        let frontier = Arc::new(Frontier::new(config.queue_capacity));
        let extractor = Extractor::new(gateway).with_config(&config);
        let links = LinkDiscoverer::new(frontier.clone());

        info!(
            knowledge_file = %config.knowledge_file.display(),
            items = store.total_items(),
            llm = extractor.has_gateway(),
            "harvester ready"
        );

        Self {
            config,
            frontier,
            store,
            extractor,
            links,
            fetcher,
            searcher,
            is_learning: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &HarvesterConfig {
        &self.config
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    pub fn searcher(&self) -> &dyn WebSearcher {
        self.searcher.as_ref()
    }

    /// Whether a learning cycle is running.
    pub fn is_learning(&self) -> bool {
        self.is_learning.load(Ordering::SeqCst)
    }

    /// Claim the learning flag. `None` when a cycle is already running.
    pub fn try_begin_learning(&self) -> Option<LearningGuard<'_>> {
        self.is_learning
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| LearningGuard {
                flag: &self.is_learning,
            })
    }

    /// Add a URL to the frontier. Returns whether it was admitted.
    pub fn enqueue(&self, url: &str) -> bool {
        self.frontier.enqueue(url)
    }

    /// Run a drained URL through fetch, extract, merge and link discovery.
    ///
    /// The URL is marked seen first, so a failed fetch is not retried.
    /// URLs already seen are skipped.
    pub async fn process_url(&self, raw: &str) -> UrlOutcome {
        let Some(url) = parse_valid_url(raw) else {
            debug!(url = %raw, "skipping invalid URL");
            return UrlOutcome::default();
        };
        if !self.frontier.mark_seen(url.as_str()) {
            debug!(url = %url, "skipping already processed URL");
            return UrlOutcome::default();
        }

        self.learn_from(&url).await
    }

    /// Process a URL immediately, outside the learning cycle.
    ///
    /// Runs even for URLs already seen; the caller asked for it explicitly.
    /// A queued copy is dropped so the next cycle does not repeat the work.
    pub async fn process_now(&self, raw: &str) -> ProcessReport {
        let Some(url) = parse_valid_url(raw) else {
            return ProcessReport::failed("Invalid URL");
        };
        self.frontier.remove(url.as_str());
        self.frontier.mark_seen(url.as_str());

        if self.learn_from(&url).await.fetched {
            ProcessReport::succeeded("URL successfully processed")
        } else {
            ProcessReport::failed("Failed to process URL")
        }
    }

    async fn learn_from(&self, url: &Url) -> UrlOutcome {
        let Some(page) = self.fetcher.fetch_page(url).await else {
            return UrlOutcome::default();
        };

        let extracted = self.extractor.extract(&page.text, url.as_str(), None).await;
        let inserted = self
            .store
            .merge(extracted.into_iter().map(Extracted::into_candidate));
        let links_admitted = self.links.discover(page.link_source(), page.url.as_str());

        info!(url = %url, inserted, links_admitted, "processed URL");
        UrlOutcome {
            fetched: true,
            inserted,
            links_admitted,
        }
    }

    /// Fetch page text for a caller, queueing the URL for learning on success.
    pub async fn fetch_content(&self, raw: &str) -> Option<String> {
        let url = parse_valid_url(raw)?;
        let text = self.fetcher.fetch_text(&url).await?;
        self.frontier.enqueue(url.as_str());
        Some(text)
    }

    /// Queue the curated documentation sites for `language`.
    ///
    /// Returns how many were admitted.
    pub fn seed_resources(&self, language: &str) -> usize {
        let resources = programming_resources(language);
        if resources.is_empty() {
            warn!(language = %language, "no curated resources for language");
        }
        resources
            .iter()
            .filter(|r| self.frontier.enqueue(r.url))
            .count()
    }

    /// Snapshot for introspection.
    pub fn status(&self) -> LearningStatus {
        let base = self.store.snapshot();
        LearningStatus {
            is_learning: self.is_learning(),
            total_items: base.total_items(),
            categories: base.counts(),
            last_updated: base.last_updated,
            queue_size: self.frontier.len(),
            processed_count: self.frontier.processed_count(),
        }
    }

    /// Retrieve knowledge; see [`KnowledgeStore::query`].
    pub fn query_knowledge(
        &self,
        topic: Option<&str>,
        language: Option<&str>,
        text: Option<&str>,
        limit: usize,
    ) -> Vec<KnowledgeHit> {
        self.store.query(topic, language, text, limit)
    }

    /// Prompt-ready context from the best matching knowledge.
    pub fn knowledge_context(
        &self,
        language: Option<&str>,
        text: Option<&str>,
        limit: usize,
    ) -> String {
        self.store.context_for(language, text, limit)
    }
}
