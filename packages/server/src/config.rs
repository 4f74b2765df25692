use anyhow::{Context, Result};
use dotenvy::dotenv;
use harvester::security::{CloudflareCredentials, ExposeSecret, SecretString};
use harvester::HarvesterConfig;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cloudflare_ai_token: Option<SecretString>,
    pub cloudflare_account_id: Option<String>,
    pub tavily_api_key: Option<SecretString>,
    pub harvester: HarvesterConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            cloudflare_ai_token: non_empty_var("CLOUDFLARE_AI_TOKEN").map(SecretString::from),
            cloudflare_account_id: non_empty_var("CLOUDFLARE_ACCOUNT_ID"),
            tavily_api_key: non_empty_var("TAVILY_API_KEY").map(SecretString::from),
            harvester: HarvesterConfig::from_env()
                .context("Invalid harvester configuration")?,
        })
    }

    /// Cloudflare credentials when both token and account id are set
    pub fn cloudflare_credentials(&self) -> Option<CloudflareCredentials> {
        CloudflareCredentials::from_parts(
            self.cloudflare_ai_token.as_ref().map(|t| t.expose_secret().to_string()),
            self.cloudflare_account_id.clone(),
        )
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
