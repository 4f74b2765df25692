//! LLM gateway implementations.
//!
//! - `CloudflareGateway` - Cloudflare Workers AI

pub mod cloudflare;

pub use cloudflare::CloudflareGateway;
