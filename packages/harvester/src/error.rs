//! Typed errors for the harvester library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur inside the harvester.
///
/// Only persistence and configuration errors escape the public API;
/// collaborator failures are logged and degraded where they happen.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// LLM gateway unavailable or failed
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Search collaborator failed
    #[error("search error: {0}")]
    Search(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Reading or writing the knowledge file failed
    #[error("persistence error at {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

/// Errors that can occur while fetching a page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Connection timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Page had no extractable text
    #[error("no content extracted from: {url}")]
    Empty { url: String },
}

/// Errors returned by an LLM gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Token or account id not configured
    #[error("missing gateway credentials")]
    MissingCredentials,

    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Gateway answered with a non-success status
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Response envelope did not contain generated text
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Call exceeded the configured timeout
    #[error("gateway call timed out")]
    Timeout,
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for gateway operations.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
