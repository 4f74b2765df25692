//! JSON-file knowledge store.
//!
//! The whole knowledge base lives in memory behind one mutex and is
//! rewritten wholesale to a single JSON document after every merge that
//! inserted something and after every query that bumped usage counts.
//! Writes go through a temporary file renamed over the target. Write
//! failures are logged and mark the store dirty: the in-memory state stays
//! authoritative and the next write or reload retries the full dump.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

use crate::error::{HarvestError, Result};
use crate::pipeline::topic::classify_topic;
use crate::types::candidate::KnowledgeCandidate;
use crate::types::knowledge::{
    Category, KnowledgeBase, KnowledgeHit, KnowledgeItem, DEFAULT_CONFIDENCE, DEFAULT_LANGUAGE,
    MIN_CONFIDENCE,
};

/// Default number of query results.
pub const DEFAULT_QUERY_LIMIT: usize = 5;

/// Knowledge base persisted as one JSON file.
pub struct KnowledgeStore {
    path: PathBuf,
    base: Mutex<KnowledgeBase>,
    dirty: AtomicBool,
}

impl KnowledgeStore {
    /// Open the store at `path`.
    ///
    /// A missing file yields an empty knowledge base, which is written out
    /// immediately. An unparsable file is moved aside and replaced by an
    /// empty base. An unreadable file is logged and left alone; the store
    /// starts empty and picks the file up on the next reload.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match read_base(&path) {
            Ok(Some(base)) => {
                info!(path = %path.display(), items = base.total_items(), "loaded knowledge base");
                Self::with_base(path, base)
            }
            Ok(None) => {
                info!(path = %path.display(), "no knowledge base found, starting empty");
                let store = Self::with_base(path, KnowledgeBase::new());
                store.persist(&store.lock());
                store
            }
            Err(HarvestError::Json(e)) => {
                error!(path = %path.display(), error = %e, "knowledge base is corrupt, starting empty");
                let aside = corrupt_path(&path);
                match fs::rename(&path, &aside) {
                    Ok(()) => warn!(path = %aside.display(), "moved corrupt knowledge base aside"),
                    Err(e) => error!(error = %e, "failed to move corrupt knowledge base aside"),
                }
                let store = Self::with_base(path, KnowledgeBase::new());
                store.persist(&store.lock());
                store
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to read knowledge base, starting empty");
                Self::with_base(path, KnowledgeBase::new())
            }
        }
    }

    /// Store seeded with `base` without touching the disk.
    pub fn with_base(path: impl Into<PathBuf>, base: KnowledgeBase) -> Self {
        Self {
            path: path.into(),
            base: Mutex::new(base),
            dirty: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, KnowledgeBase> {
        self.base.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the last write failed and memory is ahead of the file.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Refresh the in-memory state from disk.
    ///
    /// When the file is gone, or the last write failed, the current state
    /// is kept and written back instead.
    pub fn reload(&self) -> Result<()> {
        let mut base = self.lock();
        if self.is_dirty() {
            debug!(path = %self.path.display(), "retrying unsaved knowledge base before reload");
            return self.write(&base);
        }
        match read_base(&self.path)? {
            Some(loaded) => {
                debug!(path = %self.path.display(), items = loaded.total_items(), "reloaded knowledge base");
                *base = loaded;
                Ok(())
            }
            None => self.write(&base),
        }
    }

    /// Write the current state to disk.
    pub fn save(&self) -> Result<()> {
        self.write(&self.lock())
    }

    /// Merge candidates into the store. Returns the number inserted.
    ///
    /// Candidates missing a topic, key, title or summary, or carrying a
    /// confidence below the floor, are skipped. Existing items with the
    /// same key in the same category are overwritten.
    pub fn merge(&self, candidates: impl IntoIterator<Item = KnowledgeCandidate>) -> usize {
        let mut base = self.lock();
        let mut inserted = 0;

        for candidate in candidates {
            let Some((category, key, item)) = normalize(candidate) else {
                continue;
            };
            debug!(category = %category, key = %key, "storing knowledge item");
            base.category_mut(category).insert(key, item);
            inserted += 1;
        }

        if inserted > 0 {
            base.last_updated = Some(Utc::now());
            self.persist(&base);
            info!(inserted, total = base.total_items(), "merged knowledge");
        }

        inserted
    }

    /// Retrieve matching items, most used first.
    ///
    /// `topic` restricts the search to one category when it names one;
    /// otherwise all categories are scanned in enumeration order. An item
    /// matches when its language equals `language` (if given) and `text`
    /// (if given) appears case-insensitively in its title, summary, tags
    /// or code. Scanning stops once `limit` matches are collected. Every
    /// returned item has its usage count bumped.
    pub fn query(
        &self,
        topic: Option<&str>,
        language: Option<&str>,
        text: Option<&str>,
        limit: usize,
    ) -> Vec<KnowledgeHit> {
        let categories: Vec<Category> = match topic.and_then(Category::from_name) {
            Some(category) => vec![category],
            None => Category::ALL.to_vec(),
        };
        let needle = text.map(str::to_lowercase);

        let mut base = self.lock();
        let mut matches: Vec<(Category, String, u64, f32)> = Vec::new();

        'scan: for category in categories {
            for (key, item) in base.category(category) {
                if matches.len() >= limit {
                    break 'scan;
                }
                let language_ok = language.map_or(true, |lang| item.language == lang);
                let text_ok = needle.as_deref().map_or(true, |n| item.mentions(n));
                if language_ok && text_ok {
                    matches.push((category, key.clone(), item.usage_count, item.confidence));
                }
            }
        }

        matches.sort_by(|a, b| {
            b.2.cmp(&a.2)
                .then_with(|| b.3.partial_cmp(&a.3).unwrap_or(std::cmp::Ordering::Equal))
        });
        matches.truncate(limit);

        let hits: Vec<KnowledgeHit> = matches
            .into_iter()
            .filter_map(|(category, key, _, _)| {
                let item = base.category_mut(category).get_mut(&key)?;
                item.usage_count += 1;
                Some(KnowledgeHit {
                    category,
                    key,
                    item: item.clone(),
                })
            })
            .collect();

        if !hits.is_empty() {
            self.persist(&base);
        }
        debug!(hits = hits.len(), "knowledge query");
        hits
    }

    /// Render the top matches as a compact context block for prompts.
    ///
    /// Goes through [`query`](Self::query), so usage counts are bumped.
    /// Returns an empty string when nothing matches.
    pub fn context_for(&self, language: Option<&str>, text: Option<&str>, limit: usize) -> String {
        let hits = self.query(None, language, text, limit);
        if hits.is_empty() {
            return String::new();
        }

        let mut context = String::from("Relevant knowledge:\n");
        for hit in hits {
            let item = hit.item;
            context.push_str(&format!(
                "- [{}] {} ({}): {}\n",
                hit.category, item.title, item.language, item.summary
            ));
            if let Some(code) = item.code_examples.first() {
                for line in code.lines() {
                    context.push_str("    ");
                    context.push_str(line);
                    context.push('\n');
                }
            }
        }
        context
    }

    /// Clone of the current knowledge base.
    pub fn snapshot(&self) -> KnowledgeBase {
        self.lock().clone()
    }

    pub fn total_items(&self) -> usize {
        self.lock().total_items()
    }

    /// Item counts per category, in enumeration order.
    pub fn counts(&self) -> IndexMap<String, usize> {
        self.lock().counts()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.lock().last_updated
    }

    fn write(&self, base: &KnowledgeBase) -> Result<()> {
        let result = write_base(&self.path, base);
        self.dirty.store(result.is_err(), Ordering::SeqCst);
        result
    }

    fn persist(&self, base: &KnowledgeBase) {
        if let Err(e) = self.write(base) {
            error!(error = %e, "failed to persist knowledge base, keeping in-memory state");
        }
    }
}

/// Validate a candidate and build the item it describes.
fn normalize(candidate: KnowledgeCandidate) -> Option<(Category, String, KnowledgeItem)> {
    let topic = non_empty(candidate.topic)?;
    let key = non_empty(candidate.key)?;
    let title = non_empty(candidate.title)?;
    let summary = non_empty(candidate.summary)?;

    let confidence = match candidate.confidence {
        Some(c) if !c.is_finite() || c < MIN_CONFIDENCE => {
            debug!(key = %key, confidence = c, "rejected low-confidence candidate");
            return None;
        }
        Some(c) => c.min(1.0),
        None => DEFAULT_CONFIDENCE,
    };

    let category = classify_topic(&topic, &key);
    let item = KnowledgeItem {
        title,
        summary,
        language: non_empty(candidate.language).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        code_examples: candidate.code_examples,
        tags: candidate.tags.into_iter().collect::<IndexSet<_>>(),
        source: candidate.source.unwrap_or_default(),
        confidence,
        added: Utc::now(),
        usage_count: 0,
    };

    Some((category, key, item))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read the knowledge file, `None` when it does not exist.
fn read_base(path: &Path) -> Result<Option<KnowledgeBase>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(HarvestError::Persistence {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

/// Where an unparsable knowledge file is moved, e.g. `kb.json.corrupt`.
fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".corrupt");
    path.with_file_name(name)
}

/// Write the knowledge file through a temporary sibling renamed over it.
fn write_base(path: &Path, base: &KnowledgeBase) -> Result<()> {
    let persistence = |source| HarvestError::Persistence {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent).map_err(persistence)?;
            parent
        }
        None => Path::new("."),
    };

    let json = serde_json::to_string_pretty(base)?;
    let mut file = NamedTempFile::new_in(dir).map_err(persistence)?;
    file.write_all(json.as_bytes()).map_err(persistence)?;
    file.as_file().sync_all().map_err(persistence)?;
    file.persist(path).map_err(|e| persistence(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, KnowledgeStore) {
        let dir = TempDir::new().unwrap();
        let store = KnowledgeStore::open(dir.path().join("instance/knowledge_base.json"));
        (dir, store)
    }

    fn candidate(topic: &str, key: &str, title: &str) -> KnowledgeCandidate {
        KnowledgeCandidate::new(topic, key, title, format!("About {title}"))
    }

    #[test]
    fn test_open_missing_file_writes_empty_base() {
        let (_dir, store) = temp_store();

        assert!(store.path().exists());
        assert_eq!(store.total_items(), 0);
        assert_eq!(
            store.counts().keys().collect::<Vec<_>>(),
            vec![
                "programming_languages",
                "libraries",
                "algorithms",
                "best_practices",
                "common_errors"
            ]
        );
    }

    #[test]
    fn test_open_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kb.json");
        fs::write(&path, "{ not json").unwrap();

        let store = KnowledgeStore::open(&path);

        assert_eq!(store.total_items(), 0);
        assert!(!store.is_dirty());
        assert_eq!(
            fs::read_to_string(dir.path().join("kb.json.corrupt")).unwrap(),
            "{ not json"
        );
        let reopened = KnowledgeStore::open(&path);
        assert_eq!(reopened.counts().len(), 5);
    }

    #[test]
    fn test_confidence_floor() {
        let (_dir, store) = temp_store();

        let low = candidate("algorithms", "bfs", "BFS").with_confidence(0.4);
        assert_eq!(store.merge([low]), 0);

        let at_floor = candidate("algorithms", "bfs", "BFS").with_confidence(0.6);
        assert_eq!(store.merge([at_floor]), 1);
    }

    #[test]
    fn test_missing_fields_rejected() {
        let (_dir, store) = temp_store();
        let mut no_summary = candidate("algorithms", "dfs", "DFS");
        no_summary.summary = None;
        let mut blank_key = candidate("algorithms", "dfs", "DFS");
        blank_key.key = Some("  ".into());

        assert_eq!(store.merge([no_summary, blank_key]), 0);
        assert!(store.last_updated().is_none());
    }

    #[test]
    fn test_overwrite_semantics() {
        let (_dir, store) = temp_store();
        store.merge([candidate("libraries", "serde", "Serde v1")]);
        store.merge([candidate("framework", "serde", "Serde v2").with_language("rust")]);

        let base = store.snapshot();
        assert_eq!(base.libraries.len(), 1);
        let item = &base.libraries["serde"];
        assert_eq!(item.title, "Serde v2");
        assert_eq!(item.language, "rust");
        assert_eq!(item.usage_count, 0);
    }

    #[test]
    fn test_merge_applies_defaults_and_persists() {
        let (_dir, store) = temp_store();
        let inserted = store.merge([candidate("exception", "key-error", "KeyError")
            .with_tags(["dict", "dict", "python"])]);
        assert_eq!(inserted, 1);

        let reopened = KnowledgeStore::open(store.path());
        let base = reopened.snapshot();
        let item = &base.common_errors["key-error"];
        assert_eq!(item.language, "general");
        assert_eq!(item.confidence, DEFAULT_CONFIDENCE);
        assert_eq!(item.tags.len(), 2);
        assert!(base.last_updated.is_some());
    }

    #[test]
    fn test_query_filter_conjunction() {
        let (_dir, store) = temp_store();
        store.merge([
            candidate("libraries", "a", "A").with_language("python"),
            candidate("libraries", "b", "B").with_language("javascript"),
        ]);

        let hits = store.query(None, Some("python"), None, DEFAULT_QUERY_LIMIT);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].item.title, "A");

        let hits = store.query(None, Some("python"), Some("about b"), DEFAULT_QUERY_LIMIT);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_query_usage_ordering() {
        let dir = TempDir::new().unwrap();
        let mut base = KnowledgeBase::new();
        for (key, usage) in [("zero", 0), ("five", 5), ("two", 2)] {
            base.algorithms.insert(
                key.to_string(),
                KnowledgeItem::new(key, "sorting").with_usage_count(usage),
            );
        }
        let store = KnowledgeStore::with_base(dir.path().join("kb.json"), base);

        let hits = store.query(None, None, None, 3);
        let keys: Vec<&str> = hits.iter().map(|h| h.key.as_str()).collect();
        assert_eq!(keys, vec!["five", "two", "zero"]);
        assert_eq!(hits[0].item.usage_count, 6);

        let persisted = KnowledgeStore::open(dir.path().join("kb.json"));
        assert_eq!(persisted.snapshot().algorithms["zero"].usage_count, 1);
    }

    #[test]
    fn test_query_topic_restricts_category() {
        let (_dir, store) = temp_store();
        store.merge([
            candidate("algorithms", "sorting", "Sorting"),
            candidate("best_practices", "naming", "Naming"),
        ]);

        let hits = store.query(Some("best_practices"), None, None, 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].category, Category::BestPractices);

        let hits = store.query(Some("not-a-category"), None, None, 5);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_query_stops_at_limit() {
        let (_dir, store) = temp_store();
        store.merge((0..4).map(|i| candidate("libraries", &format!("lib-{i}"), "Lib")));

        let hits = store.query(None, None, None, 2);
        assert_eq!(hits.len(), 2);

        let base = store.snapshot();
        let bumped: u64 = base.libraries.values().map(|i| i.usage_count).sum();
        assert_eq!(bumped, 2);
    }

    #[test]
    fn test_context_for() {
        let (_dir, store) = temp_store();
        assert_eq!(store.context_for(None, Some("iterator"), 3), "");

        store.merge([candidate("language", "iterators", "Iterators")
            .with_language("rust")
            .with_code_example("for x in v.iter() {\n    println!(\"{x}\");\n}")]);

        let context = store.context_for(Some("rust"), Some("iterator"), 3);
        assert!(context.starts_with("Relevant knowledge:\n"));
        assert!(context.contains("[programming_languages] Iterators (rust)"));
        assert!(context.contains("    for x in v.iter() {"));
    }

    #[test]
    fn test_reload_recreates_missing_file() {
        let (_dir, store) = temp_store();
        store.merge([candidate("algorithms", "bfs", "BFS")]);
        fs::remove_file(store.path()).unwrap();

        store.reload().unwrap();

        assert!(store.path().exists());
        assert_eq!(store.total_items(), 1);
    }

    #[test]
    fn test_reload_picks_up_external_changes() {
        let (_dir, store) = temp_store();
        let other = KnowledgeStore::open(store.path());
        other.merge([candidate("algorithms", "bfs", "BFS")]);

        assert_eq!(store.total_items(), 0);
        store.reload().unwrap();
        assert_eq!(store.total_items(), 1);
    }

    #[test]
    fn test_failed_write_keeps_memory_authoritative() {
        let (_dir, store) = temp_store();
        store.merge([candidate("algorithms", "bfs", "BFS")]);
        let stale = fs::read_to_string(store.path()).unwrap();

        fs::remove_file(store.path()).unwrap();
        fs::create_dir(store.path()).unwrap();
        assert_eq!(store.merge([candidate("algorithms", "dfs", "DFS")]), 1);
        assert!(store.is_dirty());

        fs::remove_dir(store.path()).unwrap();
        fs::write(store.path(), stale).unwrap();
        store.reload().unwrap();

        assert_eq!(store.total_items(), 2);
        assert!(!store.is_dirty());
        assert_eq!(KnowledgeStore::open(store.path()).total_items(), 2);
    }

    #[test]
    fn test_writes_leave_no_temporary_files() {
        let dir = TempDir::new().unwrap();
        let store = KnowledgeStore::open(dir.path().join("kb.json"));
        store.merge([candidate("algorithms", "bfs", "BFS")]);

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec!["kb.json"]);
    }
}
