//! Knowledge types - categories, items and the persisted knowledge base.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Deserializer, Serialize};

/// Confidence assigned to items that do not state one.
pub const DEFAULT_CONFIDENCE: f32 = 0.7;

/// Items below this confidence are rejected at ingestion.
pub const MIN_CONFIDENCE: f32 = 0.6;

/// Language assigned to items that do not state one.
pub const DEFAULT_LANGUAGE: &str = "general";

/// One of the five fixed knowledge groupings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ProgrammingLanguages,
    Libraries,
    Algorithms,
    BestPractices,
    CommonErrors,
}

impl Category {
    /// All categories in their fixed enumeration order.
    pub const ALL: [Category; 5] = [
        Category::ProgrammingLanguages,
        Category::Libraries,
        Category::Algorithms,
        Category::BestPractices,
        Category::CommonErrors,
    ];

    /// The persisted name of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProgrammingLanguages => "programming_languages",
            Self::Libraries => "libraries",
            Self::Algorithms => "algorithms",
            Self::BestPractices => "best_practices",
            Self::CommonErrors => "common_errors",
        }
    }

    /// Look up a category by its exact persisted name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized unit of extracted programming knowledge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub title: String,

    pub summary: String,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default)]
    pub code_examples: Vec<String>,

    #[serde(default)]
    pub tags: IndexSet<String>,

    /// Origin URL
    #[serde(default)]
    pub source: String,

    #[serde(default = "default_confidence")]
    pub confidence: f32,

    /// Set at insertion, never changed afterwards
    #[serde(default = "Utc::now", deserialize_with = "lenient_timestamp")]
    pub added: DateTime<Utc>,

    /// Bumped once per retrieval
    #[serde(default)]
    pub usage_count: u64,
}

impl KnowledgeItem {
    /// Create an item with defaults applied.
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            language: DEFAULT_LANGUAGE.to_string(),
            code_examples: Vec::new(),
            tags: IndexSet::new(),
            source: String::new(),
            confidence: DEFAULT_CONFIDENCE,
            added: Utc::now(),
            usage_count: 0,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_code_example(mut self, code: impl Into<String>) -> Self {
        self.code_examples.push(code.into());
        self
    }

    pub fn with_usage_count(mut self, count: u64) -> Self {
        self.usage_count = count;
        self
    }

    /// Case-insensitive containment in title, summary, any tag or any code example.
    ///
    /// `needle` must already be lowercased.
    pub fn mentions(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.summary.to_lowercase().contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
            || self
                .code_examples
                .iter()
                .any(|c| c.to_lowercase().contains(needle))
    }
}

/// Items of one category, keyed by a slug unique within the category.
pub type CategoryItems = IndexMap<String, KnowledgeItem>;

/// The aggregate knowledge base, serialized as one JSON document.
///
/// Unknown top-level keys are ignored when loading and missing
/// categories come back empty, so the five-category shape always holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub programming_languages: CategoryItems,

    #[serde(default)]
    pub libraries: CategoryItems,

    #[serde(default)]
    pub algorithms: CategoryItems,

    #[serde(default)]
    pub best_practices: CategoryItems,

    #[serde(default)]
    pub common_errors: CategoryItems,

    #[serde(default, deserialize_with = "lenient_optional_timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl KnowledgeBase {
    /// Create an empty knowledge base with all five categories.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(&self, category: Category) -> &CategoryItems {
        match category {
            Category::ProgrammingLanguages => &self.programming_languages,
            Category::Libraries => &self.libraries,
            Category::Algorithms => &self.algorithms,
            Category::BestPractices => &self.best_practices,
            Category::CommonErrors => &self.common_errors,
        }
    }

    pub fn category_mut(&mut self, category: Category) -> &mut CategoryItems {
        match category {
            Category::ProgrammingLanguages => &mut self.programming_languages,
            Category::Libraries => &mut self.libraries,
            Category::Algorithms => &mut self.algorithms,
            Category::BestPractices => &mut self.best_practices,
            Category::CommonErrors => &mut self.common_errors,
        }
    }

    /// Total number of items across all categories.
    pub fn total_items(&self) -> usize {
        Category::ALL.iter().map(|c| self.category(*c).len()).sum()
    }

    /// Item counts per category, in enumeration order.
    pub fn counts(&self) -> IndexMap<String, usize> {
        Category::ALL
            .iter()
            .map(|c| (c.as_str().to_string(), self.category(*c).len()))
            .collect()
    }
}

/// A single query result row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeHit {
    pub category: Category,
    pub key: String,
    pub item: KnowledgeItem,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_confidence() -> f32 {
    DEFAULT_CONFIDENCE
}

/// Parse RFC 3339, falling back to a naive ISO timestamp taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn lenient_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_optional_timestamp(deserializer)?.unwrap_or_else(Utc::now))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_name(category.as_str()), Some(category));
        }
        assert_eq!(Category::from_name("frameworks"), None);
    }

    #[test]
    fn test_empty_base_has_all_categories() {
        let kb = KnowledgeBase::new();
        let json = serde_json::to_value(&kb).unwrap();

        for category in Category::ALL {
            assert!(json[category.as_str()].is_object());
        }
        assert!(json["last_updated"].is_null());
    }

    #[test]
    fn test_unknown_sections_are_ignored() {
        let json = r#"{
            "libraries": {
                "serde": {"title": "Serde", "summary": "Serialization framework"}
            },
            "scratch": {"anything": 1},
            "last_updated": "2024-03-01T10:00:00.123456"
        }"#;

        let kb: KnowledgeBase = serde_json::from_str(json).unwrap();

        assert_eq!(kb.total_items(), 1);
        assert!(kb.algorithms.is_empty());
        assert!(kb.last_updated.is_some());

        let item = &kb.libraries["serde"];
        assert_eq!(item.language, "general");
        assert_eq!(item.confidence, DEFAULT_CONFIDENCE);
        assert_eq!(item.usage_count, 0);
    }

    #[test]
    fn test_mentions_is_case_insensitive() {
        let item = KnowledgeItem::new("Iterators", "Lazy sequences")
            .with_tag("Rust")
            .with_code_example("v.iter().map(|x| x * 2)");

        assert!(item.mentions("iterators"));
        assert!(item.mentions("rust"));
        assert!(item.mentions("map("));
        assert!(!item.mentions("python"));
    }

    #[test]
    fn test_counts_follow_enumeration_order() {
        let mut kb = KnowledgeBase::new();
        kb.common_errors
            .insert("npe".into(), KnowledgeItem::new("NPE", "Null pointer"));

        let counts = kb.counts();
        let names: Vec<_> = counts.keys().cloned().collect();

        assert_eq!(
            names,
            vec![
                "programming_languages",
                "libraries",
                "algorithms",
                "best_practices",
                "common_errors"
            ]
        );
        assert_eq!(counts["common_errors"], 1);
    }
}
