//! Relay Client
//!
//! Talks to the chat relay over HTTP. One POST per chat turn, no streaming.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::session::Message;

/// Reply text used when the relay response carries none
pub const EMPTY_REPLY: &str = "...";

/// `GET /api/health` body
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Health {
    /// `"ok"` when the relay is up
    pub status: String,
    /// Persona display name
    pub character: String,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    messages: &'a [Message],
}

/// HTTP client for the chat relay
#[derive(Clone, Debug)]
pub struct RelayClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl RelayClient {
    /// Create a client for the relay at `base_url` (e.g. `http://127.0.0.1:3000`)
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// Relay base URL without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send the conversation and return the assistant reply
    ///
    /// # Errors
    ///
    /// `API error: <status>` for a non-success response; transport and
    /// decode failures are passed through.
    pub async fn chat(&self, messages: &[Message]) -> anyhow::Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .json(&ChatBody { messages })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("API error: {}", status.as_u16());
        }

        let data: serde_json::Value = response.json().await?;
        Ok(extract_reply(&data))
    }

    /// Probe the relay
    ///
    /// # Errors
    ///
    /// Fails if the relay is unreachable or answers with an error status.
    pub async fn health(&self) -> anyhow::Result<Health> {
        let url = format!("{}/api/health", self.base_url);
        let response = self.http_client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("API error: {}", status.as_u16());
        }

        Ok(response.json().await?)
    }
}

/// Reply text from a relay response
///
/// Prefers `message`, then a raw completion shape
/// (`choices[0].message.content`), then [`EMPTY_REPLY`]. Empty strings
/// count as absent.
#[must_use]
pub fn extract_reply(data: &serde_json::Value) -> String {
    let non_empty = |v: &serde_json::Value| v.as_str().filter(|s| !s.is_empty()).map(str::to_string);

    data.get("message")
        .and_then(non_empty)
        .or_else(|| data.pointer("/choices/0/message/content").and_then(non_empty))
        .unwrap_or_else(|| EMPTY_REPLY.to_string())
}
