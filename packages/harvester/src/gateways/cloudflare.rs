//! Cloudflare Workers AI gateway.
//!
//! # Example
//!
//! ```rust,ignore
//! use harvester::gateways::CloudflareGateway;
//!
//! let gateway = CloudflareGateway::new(CloudflareCredentials::new(token, account_id));
//! let text = gateway.complete("Explain iterators", None).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GatewayError, GatewayResult};
use crate::security::{CloudflareCredentials, ExposeSecret};
use crate::traits::gateway::LlmGateway;

/// Text-generation model used by default.
pub const DEFAULT_MODEL: &str = "@cf/meta/llama-3-8b-instruct";

const API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Gateway over the Workers AI `run` endpoint.
#[derive(Clone)]
pub struct CloudflareGateway {
    client: Client,
    credentials: Option<CloudflareCredentials>,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl CloudflareGateway {
    pub fn new(credentials: CloudflareCredentials) -> Self {
        Self::from_optional(Some(credentials))
    }

    /// Gateway that may lack credentials; every call then fails with
    /// [`GatewayError::MissingCredentials`].
    pub fn from_optional(credentials: Option<CloudflareCredentials>) -> Self {
        Self {
            client: Client::new(),
            credentials: credentials.filter(CloudflareCredentials::is_complete),
            model: DEFAULT_MODEL.to_string(),
            base_url: API_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the model (default: `@cf/meta/llama-3-8b-instruct`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, account_id: &str) -> String {
        format!(
            "{}/accounts/{}/ai/run/{}",
            self.base_url.trim_end_matches('/'),
            account_id,
            self.model
        )
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    #[serde(default)]
    result: Option<RunResult>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RunResult {
    response: Option<String>,
}

fn build_messages<'a>(prompt: &'a str, system_message: Option<&'a str>) -> Vec<ChatMessage<'a>> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system_message {
        messages.push(ChatMessage {
            role: "system",
            content: system,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: prompt,
    });
    messages
}

fn response_text(body: RunResponse) -> GatewayResult<String> {
    if body.success == Some(false) {
        return Err(GatewayError::InvalidResponse(format!(
            "request unsuccessful: {:?}",
            body.errors
        )));
    }
    body.result
        .and_then(|r| r.response)
        .ok_or_else(|| GatewayError::InvalidResponse("missing result.response".into()))
}

#[async_trait]
impl LlmGateway for CloudflareGateway {
    async fn complete(&self, prompt: &str, system_message: Option<&str>) -> GatewayResult<String> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(GatewayError::MissingCredentials)?;

        let request = RunRequest {
            messages: build_messages(prompt, system_message),
            stream: false,
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "Cloudflare AI request");
        let response = self
            .client
            .post(self.endpoint(&credentials.account_id))
            .bearer_auth(credentials.api_token.expose_secret())
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else {
                    GatewayError::Http(Box::new(e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: RunResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        response_text(body)
    }

    fn name(&self) -> &str {
        "cloudflare"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let gateway = CloudflareGateway::new(CloudflareCredentials::new("token", "acct"));
        assert_eq!(
            gateway.endpoint("acct"),
            "https://api.cloudflare.com/client/v4/accounts/acct/ai/run/@cf/meta/llama-3-8b-instruct"
        );
    }

    #[test]
    fn test_messages_include_optional_system() {
        let json = serde_json::to_value(RunRequest {
            messages: build_messages("hi", Some("be brief")),
            stream: false,
        })
        .unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["stream"], false);

        assert_eq!(build_messages("hi", None).len(), 1);
    }

    #[test]
    fn test_response_text() {
        let ok: RunResponse =
            serde_json::from_str(r#"{"result": {"response": "Hello"}, "success": true}"#).unwrap();
        assert_eq!(response_text(ok).unwrap(), "Hello");

        let failed: RunResponse =
            serde_json::from_str(r#"{"success": false, "errors": [{"code": 7000}]}"#).unwrap();
        assert!(matches!(
            response_text(failed),
            Err(GatewayError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let gateway = CloudflareGateway::from_optional(None);
        assert!(!gateway.has_credentials());
        assert!(matches!(
            gateway.complete("hi", None).await,
            Err(GatewayError::MissingCredentials)
        ));

        let blank = CloudflareGateway::new(CloudflareCredentials::new("", "acct"));
        assert!(!blank.has_credentials());
    }
}
