//! Completion Backends
//!
//! - [`OpenAiBackend`]: forwards to an OpenAI-compatible completion API
//! - [`DemoBackend`]: canned reply when no credential is configured

pub mod demo;
pub mod openai;
pub mod traits;

use std::sync::Arc;

pub use demo::DemoBackend;
pub use openai::{extract_reply, OpenAiBackend, EMPTY_REPLY};
pub use traits::{BackendError, ChatMessage, CompletionBackend, CompletionReply, CompletionRequest};

use crate::config::RelayConfig;

/// Pick the backend the configuration calls for
///
/// # Errors
///
/// Fails if the upstream HTTP client cannot be built.
pub fn select_backend(config: &RelayConfig) -> Result<Arc<dyn CompletionBackend>, BackendError> {
    match OpenAiBackend::from_config(&config.upstream)? {
        Some(backend) => Ok(Arc::new(backend)),
        None => Ok(Arc::new(DemoBackend::new(config.persona.name.clone()))),
    }
}
