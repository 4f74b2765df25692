//! Cloudflare account credentials.
//!
//! The token is held as a `secrecy::SecretString`, so it only leaves
//! memory through an explicit `expose_secret()` when a request is signed.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

/// Cloudflare Workers AI account credentials.
#[derive(Clone)]
pub struct CloudflareCredentials {
    pub api_token: SecretString,
    pub account_id: String,
}

impl CloudflareCredentials {
    pub fn new(api_token: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            api_token: SecretString::from(api_token.into()),
            account_id: account_id.into(),
        }
    }

    /// Credentials from optional parts, `None` unless both are non-empty.
    pub fn from_parts(api_token: Option<String>, account_id: Option<String>) -> Option<Self> {
        let api_token = api_token.filter(|t| !t.trim().is_empty())?;
        let account_id = account_id.filter(|a| !a.trim().is_empty())?;
        Some(Self::new(api_token, account_id))
    }

    pub fn is_complete(&self) -> bool {
        !self.api_token.expose_secret().trim().is_empty() && !self.account_id.trim().is_empty()
    }
}

impl fmt::Debug for CloudflareCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudflareCredentials")
            .field("account_id", &self.account_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_not_in_debug() {
        let creds = CloudflareCredentials::new("cf-secret", "acct-123");
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("cf-secret"));
        assert!(debug.contains("acct-123"));
        assert_eq!(creds.api_token.expose_secret(), "cf-secret");
    }

    #[test]
    fn test_from_parts_requires_both() {
        assert!(CloudflareCredentials::from_parts(Some("t".into()), Some("a".into())).is_some());
        assert!(CloudflareCredentials::from_parts(Some("t".into()), None).is_none());
        assert!(CloudflareCredentials::from_parts(Some(" ".into()), Some("a".into())).is_none());
        assert!(CloudflareCredentials::from_parts(None, None).is_none());
    }

    #[test]
    fn test_blank_token_is_incomplete() {
        assert!(!CloudflareCredentials::new("", "acct").is_complete());
        assert!(CloudflareCredentials::new("t", "acct").is_complete());
    }
}
