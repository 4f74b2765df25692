//! URL frontier: bounded FIFO queue plus the set of processed URLs.
//!
//! A URL is admitted only if it parses with a scheme and a host and is
//! neither queued nor seen. URLs move to `seen` exactly once, when
//! processing starts, so a failed fetch is never retried.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;
use url::Url;

/// Default bounded queue depth for the frontier.
pub const DEFAULT_FRONTIER_CAPACITY: usize = 1000;

/// Parse a URL, keeping it only if it has both a scheme and a host.
pub fn parse_valid_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Some(url),
        _ => None,
    }
}

/// Whether a string is an admissible URL.
pub fn is_valid_url(raw: &str) -> bool {
    parse_valid_url(raw).is_some()
}

#[derive(Default)]
struct FrontierState {
    queue: VecDeque<String>,
    queued: HashSet<String>,
    seen: HashSet<String>,
}

/// Shared queue of URLs awaiting processing.
///
/// All operations take `&self`; the frontier is shared between the
/// scheduler and request handlers behind an `Arc`.
pub struct Frontier {
    state: Mutex<FrontierState>,
    capacity: usize,
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new(DEFAULT_FRONTIER_CAPACITY)
    }
}

impl Frontier {
    /// Create an empty frontier holding at most `capacity` queued URLs.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(FrontierState::default()),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a URL to the tail. Returns whether it was admitted.
    ///
    /// When the queue is full the oldest queued URL is evicted.
    pub fn enqueue(&self, raw: &str) -> bool {
        let Some(url) = parse_valid_url(raw) else {
            debug!(url = %raw, "rejected invalid URL");
            return false;
        };
        let url = String::from(url);

        let mut state = self.lock();
        if state.seen.contains(&url) || state.queued.contains(&url) {
            debug!(url = %url, "rejected duplicate URL");
            return false;
        }

        if state.queue.len() >= self.capacity {
            if let Some(evicted) = state.queue.pop_front() {
                state.queued.remove(&evicted);
                debug!(url = %evicted, "frontier full, evicted oldest URL");
            }
        }

        state.queued.insert(url.clone());
        state.queue.push_back(url.clone());
        debug!(url = %url, queue_size = state.queue.len(), "added URL to queue");
        true
    }

    /// Pop the head of the queue.
    pub fn dequeue(&self) -> Option<String> {
        let mut state = self.lock();
        let url = state.queue.pop_front()?;
        state.queued.remove(&url);
        Some(url)
    }

    /// Drop `raw` from the queue if it is waiting there.
    pub fn remove(&self, raw: &str) -> bool {
        let url = normalize(raw);
        let mut state = self.lock();
        if !state.queued.remove(&url) {
            return false;
        }
        state.queue.retain(|queued| queued != &url);
        true
    }

    /// Record that processing of `raw` has started. Idempotent.
    ///
    /// Returns `true` the first time a URL is marked.
    pub fn mark_seen(&self, raw: &str) -> bool {
        let url = normalize(raw);
        let mut state = self.lock();
        state.seen.insert(url)
    }

    pub fn is_seen(&self, raw: &str) -> bool {
        self.lock().seen.contains(&normalize(raw))
    }

    pub fn is_queued(&self, raw: &str) -> bool {
        self.lock().queued.contains(&normalize(raw))
    }

    /// Number of URLs waiting in the queue.
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    /// Number of URLs whose processing has started.
    pub fn processed_count(&self) -> usize {
        self.lock().seen.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn normalize(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(url) => url.into(),
        Err(_) => raw.trim().to_string(),
    }
}
