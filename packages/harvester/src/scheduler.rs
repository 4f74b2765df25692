//! Background learning scheduler.
//!
//! The `LearningScheduler` repeats one learning cycle per interval:
//! - Refresh the knowledge store from disk
//! - Search a random sample of topics when the frontier is empty
//! - Drain a bounded number of URLs through the pipeline
//!
//! # Example
//!
//! ```ignore
//! let scheduler = LearningScheduler::new(harvester.clone());
//! let shutdown = scheduler.shutdown_handle();
//!
//! // Spawn as background task
//! let handle = scheduler.spawn();
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::harvester::Harvester;

/// What one learning cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleReport {
    /// Search results admitted to the frontier
    pub discovered: usize,
    /// URLs drained from the frontier
    pub processed: usize,
    /// Knowledge items inserted
    pub inserted: usize,
    /// Links admitted by link discovery
    pub links_admitted: usize,
}

/// Drives learning cycles on a fixed interval.
pub struct LearningScheduler {
    harvester: Arc<Harvester>,
    shutdown: Arc<AtomicBool>,
}

impl LearningScheduler {
    pub fn new(harvester: Arc<Harvester>) -> Self {
        Self {
            harvester,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a shutdown handle.
    ///
    /// Call `store(true, Ordering::SeqCst)` on the returned Arc to stop the loop.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Stop the loop after the current wait.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Run one learning cycle.
    ///
    /// Returns `None` without touching any state when a cycle is already
    /// in progress.
    pub async fn run_cycle(&self) -> Option<CycleReport> {
        let Some(_guard) = self.harvester.try_begin_learning() else {
            debug!("learning cycle already running, skipping");
            return None;
        };

        let config = self.harvester.config();
        let frontier = self.harvester.frontier();
        let mut report = CycleReport::default();
        info!(queue_size = frontier.len(), "learning cycle starting");

        if let Err(e) = self.harvester.store().reload() {
            error!(error = %e, "failed to reload knowledge base, keeping in-memory state");
        }

        if frontier.is_empty() {
            report.discovered = self.discover().await;
        }

        for i in 0..config.max_urls_per_session {
            let Some(url) = frontier.dequeue() else {
                break;
            };
            if i > 0 && !config.url_delay.is_zero() {
                tokio::time::sleep(config.url_delay).await;
            }

            let outcome = self.harvester.process_url(&url).await;
            report.processed += 1;
            report.inserted += outcome.inserted;
            report.links_admitted += outcome.links_admitted;
        }

        info!(
            discovered = report.discovered,
            processed = report.processed,
            inserted = report.inserted,
            links_admitted = report.links_admitted,
            "learning cycle finished"
        );
        Some(report)
    }

    /// Search a random sample of topics and enqueue every result.
    async fn discover(&self) -> usize {
        let config = self.harvester.config();
        let topics: Vec<String> = {
            let mut rng = rand::thread_rng();
            config
                .topics
                .choose_multiple(&mut rng, config.topics_per_cycle)
                .cloned()
                .collect()
        };

        let mut admitted = 0;
        for topic in topics {
            match self.harvester.searcher().search(&topic, None).await {
                Ok(results) => {
                    let count = results
                        .iter()
                        .filter(|r| self.harvester.enqueue(r.url.as_str()))
                        .count();
                    debug!(topic = %topic, results = results.len(), admitted = count, "searched topic");
                    admitted += count;
                }
                Err(e) => warn!(topic = %topic, error = %e, "topic search failed"),
            }
        }
        admitted
    }

    /// Run cycles until shutdown is requested.
    ///
    /// The first cycle starts immediately.
    pub async fn run(self) {
        let period = self
            .harvester
            .config()
            .learning_interval
            .max(Duration::from_secs(1));
        info!(interval_secs = period.as_secs(), "learning scheduler starting");

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if self.is_shutdown_requested() {
                break;
            }
            self.run_cycle().await;
        }

        info!("learning scheduler stopped");
    }

    /// Spawn [`run`](Self::run) on the tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
