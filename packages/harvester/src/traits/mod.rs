//! Collaborator abstractions for the harvester.
//!
//! These traits define the interfaces the harvester consumes for page
//! fetching, web search and text generation.

pub mod fetcher;
pub mod gateway;
pub mod searcher;
