//! Storage for the knowledge base.
//!
//! - `KnowledgeStore` - JSON file, rewritten wholesale on change

pub mod knowledge;

pub use knowledge::{KnowledgeStore, DEFAULT_QUERY_LIMIT};
