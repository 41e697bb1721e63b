//! OpenAI-Compatible Backend
//!
//! Forwards chat requests to a `/v1/chat/completions` style endpoint with
//! bearer authentication. One request per chat call; no retries and no
//! streaming.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error};

use super::traits::{
    BackendError, ChatMessage, CompletionBackend, CompletionReply, CompletionRequest,
};
use crate::config::UpstreamConfig;

/// Text used when the upstream reply carries no content
pub const EMPTY_REPLY: &str = "...";

/// Wire body for the completion endpoint
#[derive(Debug, Serialize)]
struct UpstreamRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

/// OpenAI-compatible completion client
#[derive(Clone)]
pub struct OpenAiBackend {
    api_url: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl OpenAiBackend {
    /// Create a backend for `api_url` authenticating with `api_key`
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built (TLS initialisation).
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            http_client,
        })
    }

    /// Create from upstream settings; `Ok(None)` when no key is configured
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn from_config(config: &UpstreamConfig) -> Result<Option<Self>, BackendError> {
        match config.api_key {
            Some(ref key) => Self::new(config.api_url.clone(), key.clone(), config.timeout).map(Some),
            None => Ok(None),
        }
    }

    /// Endpoint this backend posts to
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

/// Pull the assistant text out of a completion response body
///
/// Missing, non-string or empty content all yield [`EMPTY_REPLY`].
#[must_use]
pub fn extract_reply(data: &serde_json::Value) -> String {
    data.pointer("/choices/0/message/content")
        .and_then(serde_json::Value::as_str)
        .filter(|content| !content.is_empty())
        .unwrap_or(EMPTY_REPLY)
        .to_string()
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionReply, BackendError> {
        let start = Instant::now();
        let body = UpstreamRequest {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!(
            url = %self.api_url,
            model = %request.model,
            messages = request.messages.len(),
            "Forwarding chat request"
        );

        let response = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "Upstream API error");
            return Err(BackendError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        Ok(CompletionReply {
            content: extract_reply(&data),
            model: request.model.clone(),
            duration_ms: u64::try_from(start.elapsed().as_millis()).ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_extract_reply() {
        let data = json!({"choices": [{"message": {"role": "assistant", "content": "Hello!"}}]});
        assert_eq!(extract_reply(&data), "Hello!");
    }

    #[test]
    fn test_extract_reply_fallbacks() {
        assert_eq!(extract_reply(&json!({})), "...");
        assert_eq!(extract_reply(&json!({"choices": []})), "...");
        assert_eq!(
            extract_reply(&json!({"choices": [{"message": {"content": ""}}]})),
            "..."
        );
        assert_eq!(
            extract_reply(&json!({"choices": [{"message": {"content": null}}]})),
            "..."
        );
    }

    #[test]
    fn test_wire_body_shape() {
        let messages = vec![ChatMessage::system("s"), ChatMessage::user("u")];
        let body = UpstreamRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            max_tokens: 200,
            temperature: 0.5,
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "s"},
                    {"role": "user", "content": "u"}
                ],
                "max_tokens": 200,
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn test_from_config_without_key() {
        let config = UpstreamConfig::default();
        assert!(OpenAiBackend::from_config(&config).unwrap().is_none());

        let config = UpstreamConfig {
            api_key: Some("sk-test".to_string()),
            ..UpstreamConfig::default()
        };
        let backend = OpenAiBackend::from_config(&config).unwrap().unwrap();
        assert_eq!(backend.api_url(), config.api_url);
        assert!(!format!("{backend:?}").contains("sk-test"));
    }
}
