//! Page fetcher implementations.

pub mod http;

pub use http::{html_to_text, HttpFetcher};
