//! Continuous-Learning Knowledge Harvester
//!
//! Crawls programming-related web pages, extracts structured knowledge
//! from them (with an LLM when one is configured, deterministically
//! otherwise), and accumulates it in a JSON-persisted knowledge base that
//! can be queried by topic, language and free text.
//!
//! # Usage
//!
//! ```rust,ignore
//! use harvester::{Harvester, HarvesterConfig, LearningScheduler};
//! use harvester::fetchers::HttpFetcher;
//! use harvester::searchers::DomainSearcher;
//!
//! let fetcher = Arc::new(HttpFetcher::new());
//! let searcher = Arc::new(DomainSearcher::new(fetcher.clone()));
//! let harvester = Arc::new(Harvester::new(HarvesterConfig::from_env()?, fetcher, searcher, None));
//!
//! // Learn in the background
//! LearningScheduler::new(harvester.clone()).spawn();
//!
//! // Serve requests
//! harvester.enqueue("https://docs.python.org/3/tutorial/");
//! let hits = harvester.query_knowledge(None, Some("python"), Some("iterator"), 5);
//! ```
//!
//! # Modules
//!
//! - [`frontier`] - Bounded URL queue with seen-set deduplication
//! - [`pipeline`] - Extraction, topic heuristics and link discovery
//! - [`stores`] - JSON-file knowledge store
//! - [`scheduler`] - Background learning loop
//! - [`traits`] - Collaborator abstractions (fetcher, searcher, gateway)
//! - [`fetchers`], [`searchers`], [`gateways`] - Collaborator implementations
//! - [`security`] - Credential handling
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod fetchers;
pub mod frontier;
pub mod gateways;
pub mod harvester;
pub mod pipeline;
pub mod scheduler;
pub mod searchers;
pub mod security;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{FetchError, GatewayError, HarvestError, Result};
pub use frontier::{is_valid_url, Frontier};
pub use harvester::{Harvester, LearningGuard};
pub use pipeline::{Extractor, LinkDiscoverer};
pub use scheduler::{CycleReport, LearningScheduler};
pub use stores::{KnowledgeStore, DEFAULT_QUERY_LIMIT};
pub use traits::{
    fetcher::{FetchedPage, PageFetcher},
    gateway::LlmGateway,
    searcher::{SearchResult, WebSearcher},
};
pub use types::{
    candidate::{Extracted, FallbackRecord, KnowledgeCandidate},
    config::HarvesterConfig,
    knowledge::{Category, KnowledgeBase, KnowledgeHit, KnowledgeItem},
    status::{LearningStatus, ProcessReport, UrlOutcome},
};
