//! Reports handed to the API layer.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

/// Snapshot of the harvester for introspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningStatus {
    pub is_learning: bool,
    pub total_items: usize,
    /// Item count per category, in enumeration order
    pub categories: IndexMap<String, usize>,
    pub last_updated: Option<DateTime<Utc>>,
    pub queue_size: usize,
    pub processed_count: usize,
}

/// Outcome of an explicitly requested `process_now`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessReport {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// What happened to one URL run through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UrlOutcome {
    /// Whether the fetch returned content
    pub fetched: bool,
    /// Items the store accepted
    pub inserted: usize,
    /// Discovered links admitted to the frontier
    pub links_admitted: usize,
}
