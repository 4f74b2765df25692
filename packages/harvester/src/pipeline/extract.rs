//! Knowledge extraction - prompt the gateway, parse its answer, or fall
//! back to a deterministic record.
//!
//! Extraction never fails: gateway errors, timeouts and unparsable
//! answers all degrade to a single [`FallbackRecord`].

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::Utc;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{GatewayError, Result};
use crate::pipeline::prompts::{format_extract_prompt, EXTRACT_SYSTEM_MESSAGE};
use crate::pipeline::topic::infer_topic;
use crate::traits::gateway::LlmGateway;
use crate::types::candidate::{Extracted, FallbackRecord, KnowledgeCandidate};
use crate::types::config::HarvesterConfig;

/// Characters of content kept in a fallback record.
pub const SNIPPET_CHARS: usize = 200;

/// Fenced code blocks kept in a fallback record.
pub const MAX_CODE_SAMPLES: usize = 3;

/// Turns fetched page text into knowledge candidates.
#[derive(Clone)]
pub struct Extractor {
    gateway: Option<Arc<dyn LlmGateway>>,
    content_limit: usize,
    llm_timeout: Duration,
}

impl Extractor {
    /// Create an extractor, optionally aided by a gateway.
    pub fn new(gateway: Option<Arc<dyn LlmGateway>>) -> Self {
        let defaults = HarvesterConfig::default();
        Self {
            gateway,
            content_limit: defaults.content_limit,
            llm_timeout: defaults.llm_timeout,
        }
    }

    /// Extractor that always produces fallback records.
    pub fn without_gateway() -> Self {
        Self::new(None)
    }

    /// Take the content limit and timeout from a harvester config.
    pub fn with_config(mut self, config: &HarvesterConfig) -> Self {
        self.content_limit = config.content_limit;
        self.llm_timeout = config.llm_timeout;
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

    pub fn has_gateway(&self) -> bool {
        self.gateway.is_some()
    }

    /// Extract knowledge candidates from page content.
    pub async fn extract(
        &self,
        content: &str,
        source_url: &str,
        topic_hint: Option<&str>,
    ) -> Vec<Extracted> {
        let content = truncate_content(content, self.content_limit);

        let Some(gateway) = &self.gateway else {
            debug!(url = %source_url, "no gateway configured, using fallback extraction");
            return vec![Extracted::Fallback(fallback_record(&content, source_url))];
        };

        let topic = match topic_hint {
            Some(hint) => hint.to_string(),
            None => infer_topic(source_url, &content).as_str().to_string(),
        };
        let prompt = format_extract_prompt(source_url, &topic, &content);

        let answer = match tokio::time::timeout(
            self.llm_timeout,
            gateway.complete(&prompt, Some(EXTRACT_SYSTEM_MESSAGE)),
        )
        .await
        {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                warn!(url = %source_url, gateway = gateway.name(), error = %e, "gateway failed, using fallback extraction");
                return vec![Extracted::Fallback(fallback_record(&content, source_url))];
            }
            Err(_) => {
                warn!(url = %source_url, gateway = gateway.name(), "gateway timed out, using fallback extraction");
                return vec![Extracted::Fallback(fallback_record(&content, source_url))];
            }
        };

        match parse_knowledge_response(&answer) {
            Ok(candidates) => {
                debug!(url = %source_url, count = candidates.len(), "parsed knowledge records");
                candidates.into_iter().map(Extracted::Record).collect()
            }
            Err(e) => {
                warn!(url = %source_url, error = %e, "unparsable gateway answer, using fallback extraction");
                vec![Extracted::Fallback(fallback_record(&content, source_url))]
            }
        }
    }
}

/// Keep at most `limit` characters, marking the cut with `...`.
pub fn truncate_content(content: &str, limit: usize) -> String {
    match content.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

/// Locate the JSON payload inside a gateway answer.
///
/// Prefers a fenced block labeled `json`, then any fenced block, then
/// the whole text.
pub fn extract_json_text(text: &str) -> &str {
    if let Some((_, rest)) = text.split_once("```json") {
        return rest.split("```").next().unwrap_or(rest).trim();
    }

    if let Some((_, rest)) = text.split_once("```") {
        let block = rest.split("```").next().unwrap_or(rest);
        let block = match block.split_once('\n') {
            Some((label, body))
                if !label.trim().is_empty()
                    && label.trim().chars().all(|c| c.is_ascii_alphanumeric()) =>
            {
                body
            }
            _ => block,
        };
        return block.trim();
    }

    text.trim()
}

/// Parse a gateway answer into candidates.
///
/// A single object becomes a one-element list; array elements that are
/// not valid records are skipped.
pub fn parse_knowledge_response(text: &str) -> Result<Vec<KnowledgeCandidate>> {
    let value: Value = serde_json::from_str(extract_json_text(text))?;

    match value {
        Value::Object(_) => Ok(vec![serde_json::from_value(value)?]),
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(candidate) => Some(candidate),
                Err(e) => {
                    debug!(error = %e, "skipping malformed knowledge record");
                    None
                }
            })
            .collect()),
        other => Err(GatewayError::InvalidResponse(format!(
            "expected a JSON object or array, got {}",
            json_kind(&other)
        ))
        .into()),
    }
}

/// Deterministic record built from raw content.
pub fn fallback_record(content: &str, source_url: &str) -> FallbackRecord {
    FallbackRecord {
        source: source_url.to_string(),
        timestamp: Utc::now(),
        content_snippet: content.chars().take(SNIPPET_CHARS).collect(),
        code_samples: find_code_blocks(content, MAX_CODE_SAMPLES),
    }
}

/// Bodies of up to `max` fenced code blocks.
pub fn find_code_blocks(content: &str, max: usize) -> Vec<String> {
    static CODE_BLOCK: OnceLock<Regex> = OnceLock::new();
    let pattern = CODE_BLOCK.get_or_init(|| {
        Regex::new(r"(?s)```[a-zA-Z0-9+#-]*\n(.*?)\n```").expect("code block pattern is valid")
    });

    pattern
        .captures_iter(content)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
        .take(max)
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
