//! Credential handling.

pub mod credentials;

pub use credentials::CloudflareCredentials;
pub use secrecy::{ExposeSecret, SecretString};
