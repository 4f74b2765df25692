//! Candidate records produced by extraction, before normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use url::Url;

use crate::pipeline::topic::detect_language;
use crate::types::knowledge::DEFAULT_LANGUAGE;

/// Topic given to fallback records; unrecognized, so the store sniffs the key.
pub const FALLBACK_TOPIC: &str = "general";

const FALLBACK_TITLE_CHARS: usize = 80;

/// A knowledge record as the LLM returned it.
///
/// Every field is optional here. The store validates and normalizes
/// candidates on merge, rejecting the ones that miss required fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeCandidate {
    #[serde(default)]
    pub topic: Option<String>,

    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub language: Option<String>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default, deserialize_with = "string_or_list")]
    pub code_examples: Vec<String>,

    #[serde(default, deserialize_with = "string_or_list")]
    pub tags: Vec<String>,

    #[serde(default)]
    pub source: Option<String>,

    #[serde(default, deserialize_with = "lenient_confidence")]
    pub confidence: Option<f32>,
}

impl KnowledgeCandidate {
    /// Create a candidate carrying the four required fields.
    pub fn new(
        topic: impl Into<String>,
        key: impl Into<String>,
        title: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            topic: Some(topic.into()),
            key: Some(key.into()),
            title: Some(title.into()),
            summary: Some(summary.into()),
            ..Default::default()
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_code_example(mut self, code: impl Into<String>) -> Self {
        self.code_examples.push(code.into());
        self
    }
}

/// Minimal deterministic record used when the gateway cannot help.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackRecord {
    pub source: String,
    pub timestamp: DateTime<Utc>,
    /// First 200 characters of the page content
    pub content_snippet: String,
    /// Up to three fenced code blocks found in the content
    pub code_samples: Vec<String>,
}

impl FallbackRecord {
    /// Normalize into a candidate the store can ingest.
    pub fn into_candidate(self) -> KnowledgeCandidate {
        let language = detect_language(&format!("{} {}", self.source, self.content_snippet))
            .unwrap_or(DEFAULT_LANGUAGE);

        let title = self
            .content_snippet
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(|line| line.chars().take(FALLBACK_TITLE_CHARS).collect::<String>())
            .unwrap_or_else(|| self.source.clone());

        KnowledgeCandidate {
            topic: Some(FALLBACK_TOPIC.to_string()),
            key: Some(slugify_source(&self.source)),
            title: Some(title),
            language: Some(language.to_string()),
            summary: Some(self.content_snippet),
            code_examples: self.code_samples,
            tags: Vec::new(),
            source: Some(self.source),
            confidence: None,
        }
    }
}

/// One output of the extractor.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// Structured record parsed from the gateway answer
    Record(KnowledgeCandidate),
    /// Deterministic fallback built from the raw content
    Fallback(FallbackRecord),
}

impl Extracted {
    pub fn into_candidate(self) -> KnowledgeCandidate {
        match self {
            Self::Record(candidate) => candidate,
            Self::Fallback(record) => record.into_candidate(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Slug of a source URL's host and path, e.g. `docs-python-org-3-x`.
pub fn slugify_source(source: &str) -> String {
    let basis = match Url::parse(source) {
        Ok(url) => format!("{}{}", url.host_str().unwrap_or_default(), url.path()),
        Err(_) => source.to_string(),
    };

    let mut slug = String::with_capacity(basis.len());
    for ch in basis.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    slug.trim_end_matches('-').to_string()
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s],
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_confidence<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64().map(|f| f as f32),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_source() {
        assert_eq!(
            slugify_source("https://docs.python.org/3/x"),
            "docs-python-org-3-x"
        );
        assert_eq!(slugify_source("https://Example.com/"), "example-com");
        assert_eq!(slugify_source("not a url"), "not-a-url");
    }

    #[test]
    fn test_candidate_tolerates_loose_shapes() {
        let json = r##"{
            "topic": "library",
            "key": "tokio",
            "title": "Tokio",
            "summary": "Async runtime",
            "tags": "async",
            "code_examples": ["#[tokio::main]", null],
            "confidence": "0.9"
        }"##;

        let candidate: KnowledgeCandidate = serde_json::from_str(json).unwrap();

        assert_eq!(candidate.tags, vec!["async"]);
        assert_eq!(candidate.code_examples, vec!["#[tokio::main]"]);
        assert_eq!(candidate.confidence, Some(0.9));
        assert_eq!(candidate.language, None);
    }

    #[test]
    fn test_fallback_into_candidate() {
        let record = FallbackRecord {
            source: "https://docs.python.org/3/x".to_string(),
            timestamp: Utc::now(),
            content_snippet: "\n  Python list comprehensions\nMore text".to_string(),
            code_samples: vec!["[x for x in y]".to_string()],
        };

        let candidate = record.into_candidate();

        assert_eq!(candidate.topic.as_deref(), Some(FALLBACK_TOPIC));
        assert_eq!(candidate.key.as_deref(), Some("docs-python-org-3-x"));
        assert_eq!(candidate.title.as_deref(), Some("Python list comprehensions"));
        assert_eq!(candidate.language.as_deref(), Some("python"));
        assert_eq!(candidate.code_examples.len(), 1);
        assert_eq!(candidate.confidence, None);
    }

    #[test]
    fn test_fallback_title_defaults_to_source() {
        let record = FallbackRecord {
            source: "https://example.com/page".to_string(),
            timestamp: Utc::now(),
            content_snippet: "   ".to_string(),
            code_samples: vec![],
        };

        let candidate = record.into_candidate();
        assert_eq!(candidate.title.as_deref(), Some("https://example.com/page"));
        assert_eq!(candidate.language.as_deref(), Some("general"));
    }
}
