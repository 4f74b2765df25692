//! Configuration for the harvester.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{HarvestError, Result};

/// Topics searched when the frontier runs dry.
pub const DEFAULT_TOPICS: &[&str] = &[
    "python best practices",
    "javascript common errors",
    "rust ownership tutorial",
    "java design patterns",
    "sorting algorithms explained",
    "go concurrency patterns",
    "c++ memory management",
    "python exception handling",
    "react hooks guide",
    "sql query optimization",
];

/// Configuration for the learning pipeline and its scheduler.
#[derive(Debug, Clone)]
pub struct HarvesterConfig {
    /// JSON document backing the knowledge store.
    ///
    /// Default: `instance/knowledge_base.json`.
    pub knowledge_file: PathBuf,

    /// Wall-clock interval between learning cycles.
    ///
    /// Default: one hour.
    pub learning_interval: Duration,

    /// URLs drained from the frontier per cycle. Default: 5.
    pub max_urls_per_session: usize,

    /// Frontier capacity; the oldest entry is evicted when full. Default: 1000.
    pub queue_capacity: usize,

    /// Pause between two URLs of the same cycle. Default: 2s.
    pub url_delay: Duration,

    /// Candidate search topics.
    pub topics: Vec<String>,

    /// Topics sampled per cycle when the frontier is empty. Default: 3.
    pub topics_per_cycle: usize,

    /// Characters of page content kept for the extraction prompt. Default: 10,000.
    pub content_limit: usize,

    /// Upper bound on a single gateway call. Default: 30s.
    pub llm_timeout: Duration,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            knowledge_file: PathBuf::from("instance/knowledge_base.json"),
            learning_interval: Duration::from_secs(3600),
            max_urls_per_session: 5,
            queue_capacity: 1000,
            url_delay: Duration::from_secs(2),
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
            topics_per_cycle: 3,
            content_limit: 10_000,
            llm_timeout: Duration::from_secs(30),
        }
    }
}

impl HarvesterConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `KNOWLEDGE_FILE`, `LEARNING_INTERVAL` (seconds)
    /// and `MAX_URLS_PER_SESSION`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("KNOWLEDGE_FILE") {
            config.knowledge_file = PathBuf::from(path);
        }
        if let Some(secs) = env_number::<u64>("LEARNING_INTERVAL")? {
            config.learning_interval = Duration::from_secs(secs);
        }
        if let Some(max) = env_number::<usize>("MAX_URLS_PER_SESSION")? {
            config.max_urls_per_session = max;
        }

        Ok(config)
    }

    pub fn with_knowledge_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.knowledge_file = path.into();
        self
    }

    pub fn with_learning_interval(mut self, interval: Duration) -> Self {
        self.learning_interval = interval;
        self
    }

    pub fn with_max_urls_per_session(mut self, max: usize) -> Self {
        self.max_urls_per_session = max;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_url_delay(mut self, delay: Duration) -> Self {
        self.url_delay = delay;
        self
    }

    /// Replace the candidate topics.
    pub fn with_topics(mut self, topics: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_topics_per_cycle(mut self, count: usize) -> Self {
        self.topics_per_cycle = count;
        self
    }

    pub fn with_content_limit(mut self, limit: usize) -> Self {
        self.content_limit = limit;
        self
    }

    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = timeout;
        self
    }
}

fn env_number<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| HarvestError::Config(format!("{name} must be a number, got {raw:?}"))),
        Err(_) => Ok(None),
    }
}
