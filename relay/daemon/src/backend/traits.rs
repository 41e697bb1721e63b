//! Completion Backend Traits
//!
//! Abstraction over whatever answers a chat request: a real
//! OpenAI-compatible completion API, or the canned demo responder used
//! when no credential is configured. The HTTP layer only ever sees
//! [`CompletionBackend`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// One conversation turn, kept exactly as the client sent it
///
/// Entries are opaque JSON: multi-part `content` arrays, `name` fields and
/// anything else a completion API accepts reach upstream untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatMessage(Value);

impl ChatMessage {
    /// Create a `{role, content}` message
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self(json!({ "role": role.into(), "content": content.into() }))
    }

    /// System instruction
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    /// User turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }

    /// `role` field, when it is a string
    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.0.get("role").and_then(Value::as_str)
    }

    /// Raw JSON entry
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for ChatMessage {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// A completion request as forwarded upstream
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,
    /// Full message list, system instruction first
    pub messages: Vec<ChatMessage>,
    /// Completion length cap
    pub max_tokens: u32,
    /// Sampling temperature (0.0-2.0)
    pub temperature: f32,
}

impl CompletionRequest {
    /// Create a request for `model` with no messages
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            max_tokens: 200,
            temperature: 0.8,
        }
    }

    /// Set the conversation
    #[must_use]
    pub fn with_messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = messages;
        self
    }

    /// Prepend a system instruction
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.messages.insert(0, ChatMessage::system(system));
        self
    }

    /// Set max tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }
}

/// Response from a completion backend
#[derive(Clone, Debug)]
pub struct CompletionReply {
    /// Assistant text
    pub content: String,
    /// Model that produced it
    pub model: String,
    /// Round-trip time in milliseconds
    pub duration_ms: Option<u64>,
}

/// Errors from a completion backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// Upstream answered with a non-success status
    #[error("Upstream returned {status}: {body}")]
    Upstream {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Request could not be sent or the response could not be read
    #[error("Upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body was not the expected JSON
    #[error("Malformed upstream response: {0}")]
    Decode(String),
}

/// Completion backend trait
///
/// Implement this trait to answer chat requests from a different source.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Backend name for logs (e.g. "OpenAI", "Demo")
    fn name(&self) -> &str;

    /// Whether the backend talks to a real upstream
    fn is_demo(&self) -> bool {
        false
    }

    /// Produce a single reply for `request`
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionReply, BackendError>;
}
