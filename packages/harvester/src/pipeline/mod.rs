//! Knowledge pipeline.
//!
//! The pipeline covers:
//! - Topic inference and category mapping (keyword heuristics)
//! - Extraction (LLM prompt, response parsing, deterministic fallback)
//! - Link discovery (feeding relevant links back to the frontier)

pub mod extract;
pub mod links;
pub mod prompts;
pub mod topic;

pub use extract::{parse_knowledge_response, Extractor};
pub use links::LinkDiscoverer;
pub use prompts::{format_extract_prompt, EXTRACT_PROMPT, EXTRACT_SYSTEM_MESSAGE};
pub use topic::{classify_topic, detect_language, infer_topic};
