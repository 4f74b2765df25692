//! Keyword heuristics: topic inference, language detection and the
//! mapping of free-form topics onto the five categories.

use crate::types::knowledge::Category;

/// Characters of content inspected when inferring a topic.
const TOPIC_SNIFF_CHARS: usize = 1000;

/// Known language tokens, each with the spellings that identify it.
const LANGUAGES: &[(&str, &[&str])] = &[
    ("python", &["python", "py"]),
    ("javascript", &["javascript", "js", "nodejs"]),
    ("java", &["java"]),
    ("cpp", &["cpp", "c++", "cplusplus"]),
    ("go", &["go", "golang"]),
    ("rust", &["rust"]),
    ("php", &["php"]),
    ("ruby", &["ruby"]),
];

/// Ordered synonym table for free-form topics.
const TOPIC_SYNONYMS: &[(&str, Category)] = &[
    ("programming_language", Category::ProgrammingLanguages),
    ("language", Category::ProgrammingLanguages),
    ("syntax", Category::ProgrammingLanguages),
    ("librar", Category::Libraries),
    ("framework", Category::Libraries),
    ("package", Category::Libraries),
    ("module", Category::Libraries),
    ("tool", Category::Libraries),
    ("algorithm", Category::Algorithms),
    ("data_structure", Category::Algorithms),
    ("best_practice", Category::BestPractices),
    ("practice", Category::BestPractices),
    ("pattern", Category::BestPractices),
    ("convention", Category::BestPractices),
    ("guideline", Category::BestPractices),
    ("common_error", Category::CommonErrors),
    ("error", Category::CommonErrors),
    ("exception", Category::CommonErrors),
    ("bug", Category::CommonErrors),
    ("debug", Category::CommonErrors),
];

/// Keywords sniffed in an item key when its topic is unrecognized.
const KEY_KEYWORDS: &[(&str, Category)] = &[
    ("algorithm", Category::Algorithms),
    ("sort", Category::Algorithms),
    ("graph", Category::Algorithms),
    ("error", Category::CommonErrors),
    ("exception", Category::CommonErrors),
    ("bug", Category::CommonErrors),
    ("practice", Category::BestPractices),
    ("pattern", Category::BestPractices),
    ("syntax", Category::ProgrammingLanguages),
];

/// Infer a working topic from a URL and the start of the page content.
///
/// Checks run in order: algorithm, error/exception, best+practice,
/// a known language token; anything else is a library.
pub fn infer_topic(url: &str, content: &str) -> Category {
    let prefix: String = content.chars().take(TOPIC_SNIFF_CHARS).collect();
    let haystack = format!("{} {}", url, prefix).to_lowercase();

    if haystack.contains("algorithm") {
        Category::Algorithms
    } else if haystack.contains("error") || haystack.contains("exception") {
        Category::CommonErrors
    } else if haystack.contains("best") && haystack.contains("practice") {
        Category::BestPractices
    } else if detect_language(&haystack).is_some() {
        Category::ProgrammingLanguages
    } else {
        Category::Libraries
    }
}

/// First known language named in `text`, matched on whole tokens.
pub fn detect_language(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '+'))
        .filter(|t| !t.is_empty())
        .collect();

    LANGUAGES
        .iter()
        .find(|(_, spellings)| tokens.iter().any(|t| spellings.contains(t)))
        .map(|(name, _)| *name)
}

/// Map a candidate's free-form topic onto a category.
///
/// Exact category names win, then the synonym table in order, then
/// keyword sniffing on the key. Defaults to libraries.
pub fn classify_topic(topic: &str, key: &str) -> Category {
    let normalized = topic
        .trim()
        .to_lowercase()
        .replace([' ', '-'], "_");

    if let Some(category) = Category::from_name(&normalized) {
        return category;
    }

    if let Some((_, category)) = TOPIC_SYNONYMS
        .iter()
        .find(|(synonym, _)| normalized.contains(synonym))
    {
        return *category;
    }

    let key = key.to_lowercase();
    KEY_KEYWORDS
        .iter()
        .find(|(keyword, _)| key.contains(keyword))
        .map(|(_, category)| *category)
        .unwrap_or(Category::Libraries)
}
