//! LLM prompts for knowledge extraction.

/// System message sent with every extraction request.
pub const EXTRACT_SYSTEM_MESSAGE: &str = "You are an experienced software engineer who curates \
a knowledge base of programming facts. You answer with JSON only.";

/// Prompt for turning a page into structured knowledge records.
pub const EXTRACT_PROMPT: &str = r#"Extract reusable programming knowledge from this web page.

Focus on the topic "{topic}". For every distinct fact, technique, library,
algorithm, practice or common error on the page, produce one record.

Output a JSON object, or a JSON array of objects, with these fields:
{
    "topic": "one of programming_languages, libraries, algorithms, best_practices, common_errors",
    "key": "unique-slug-for-this-record",
    "title": "short title",
    "language": "programming language the record applies to, or general",
    "summary": "2-3 sentence explanation",
    "code_examples": ["short code snippets taken from the page"],
    "tags": ["keywords"],
    "source": "{url}",
    "confidence": 0.0 to 1.0
}

Only include what the page actually states. Lower the confidence when unsure.

Page URL: {url}
Page Content:
{content}"#;

/// Format the extraction prompt.
pub fn format_extract_prompt(url: &str, topic: &str, content: &str) -> String {
    EXTRACT_PROMPT
        .replace("{topic}", topic)
        .replace("{url}", url)
        .replace("{content}", content)
}
