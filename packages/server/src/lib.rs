// Knowledge Harvester - API Core
//
// Thin HTTP layer over the harvester library: configuration, router and
// the background learning loop started with the server.

pub mod config;
pub mod server;

pub use config::*;
