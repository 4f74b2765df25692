pub mod candidate;
pub mod config;
pub mod knowledge;
pub mod status;
