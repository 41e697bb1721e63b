//! Demo Backend
//!
//! Answers every request with a fixed greeting naming the persona. Selected
//! when no API key is configured so the front end stays usable offline.

use async_trait::async_trait;

use super::traits::{BackendError, CompletionBackend, CompletionReply, CompletionRequest};

/// Canned responder
#[derive(Clone, Debug)]
pub struct DemoBackend {
    persona_name: String,
}

impl DemoBackend {
    /// Create a demo responder speaking as `persona_name`
    pub fn new(persona_name: impl Into<String>) -> Self {
        Self {
            persona_name: persona_name.into(),
        }
    }

    /// The fixed reply text
    #[must_use]
    pub fn reply_text(&self) -> String {
        format!(
            "Hi! I'm {}! No API key is configured, so I'm running in demo mode. \
             Set RELAY_API_KEY to connect me to a model!",
            self.persona_name
        )
    }
}

#[async_trait]
impl CompletionBackend for DemoBackend {
    fn name(&self) -> &str {
        "Demo"
    }

    fn is_demo(&self) -> bool {
        true
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionReply, BackendError> {
        Ok(CompletionReply {
            content: self.reply_text(),
            model: request.model.clone(),
            duration_ms: Some(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_reply_names_persona() {
        let backend = DemoBackend::new("Mika");
        let reply = backend
            .complete(&CompletionRequest::new("any"))
            .await
            .unwrap();

        assert!(reply.content.contains("Mika"));
        assert!(reply.content.contains("demo mode"));
        assert!(backend.is_demo());
    }
}
