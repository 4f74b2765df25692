//! Web searcher implementations.
//!
//! - `DomainSearcher` - site search pages of known programming domains
//! - `TavilySearcher` - Tavily API

pub mod domain;
pub mod tavily;

pub use domain::{programming_resources, DomainSearcher, Resource, SEARCH_DOMAINS};
pub use tavily::TavilySearcher;
