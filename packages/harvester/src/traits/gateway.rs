//! LLM gateway trait.
//!
//! The gateway turns a prompt (plus an optional system message) into
//! generated text. It may fail or time out; the extractor treats every
//! failure as "no help available" and falls back to deterministic output.

use async_trait::async_trait;

use crate::error::GatewayResult;

/// Text-generation collaborator.
///
/// # Implementations
///
/// - `CloudflareGateway` - Cloudflare Workers AI
/// - `MockGateway` - for testing
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Generate text for a prompt.
    async fn complete(&self, prompt: &str, system_message: Option<&str>) -> GatewayResult<String>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "llm"
    }
}
