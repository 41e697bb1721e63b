//! HTTP Server
//!
//! Routes:
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `POST` | `/api/chat` | forward conversation to the backend |
//! | `GET` | `/api/health` | liveness + persona name |
//! | any | everything else | static front end, `index.html` fallback |
//!
//! Handlers share one immutable [`RelayState`]; nothing is mutated after
//! start-up.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::backend::{
    select_backend, BackendError, ChatMessage, CompletionBackend, CompletionRequest,
};
use crate::config::{Persona, RelayConfig};
use crate::error::RelayError;

/// Content type for VRM avatar models
pub const VRM_CONTENT_TYPE: &str = "model/gltf-binary";

/// Shared, read-only handler state
pub struct RelayState {
    persona: Persona,
    backend: Arc<dyn CompletionBackend>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl RelayState {
    /// Build state from configuration with an explicit backend
    pub fn new(config: &RelayConfig, backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            persona: config.persona.clone(),
            backend,
            model: config.upstream.model.clone(),
            max_tokens: config.upstream.max_tokens,
            temperature: config.upstream.temperature,
        }
    }

    /// Build state, choosing the backend from configuration
    ///
    /// # Errors
    ///
    /// Fails if the upstream HTTP client cannot be built.
    pub fn from_config(config: &RelayConfig) -> Result<Self, BackendError> {
        Ok(Self::new(config, select_backend(config)?))
    }

    /// Character the relay speaks as
    #[must_use]
    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    /// Backend answering chat requests
    #[must_use]
    pub fn backend(&self) -> &dyn CompletionBackend {
        self.backend.as_ref()
    }

    /// Upstream request for a client conversation, persona prompt first
    #[must_use]
    pub fn build_request(&self, messages: Vec<ChatMessage>) -> CompletionRequest {
        CompletionRequest::new(self.model.clone())
            .with_messages(messages)
            .with_system(self.persona.system_prompt.clone())
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
    }
}

/// `POST /api/chat` success body
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Assistant reply text
    pub message: String,
}

/// `GET /api/health` body
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`
    pub status: String,
    /// Persona display name
    pub character: String,
}

/// Extract the conversation from a chat request body
///
/// A body that is not JSON, or whose `messages` is missing or not an array,
/// is treated as carrying no messages at all. Array entries are taken as-is.
///
/// # Errors
///
/// [`RelayError::MissingMessages`].
pub fn parse_messages(body: &[u8]) -> Result<Vec<ChatMessage>, RelayError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| RelayError::MissingMessages)?;

    match value {
        serde_json::Value::Object(mut fields) => match fields.remove("messages") {
            Some(serde_json::Value::Array(items)) => {
                Ok(items.into_iter().map(ChatMessage::from).collect())
            }
            _ => Err(RelayError::MissingMessages),
        },
        _ => Err(RelayError::MissingMessages),
    }
}

async fn chat(
    State(state): State<Arc<RelayState>>,
    body: Bytes,
) -> Result<Json<ChatResponse>, RelayError> {
    let messages = parse_messages(&body)?;
    let request = state.build_request(messages);

    let reply = state.backend.complete(&request).await.map_err(|e| {
        error!(backend = state.backend.name(), error = %e, "Chat request failed");
        RelayError::from(e)
    })?;

    Ok(Json(ChatResponse {
        message: reply.content,
    }))
}

async fn health(State(state): State<Arc<RelayState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        character: state.persona.name.clone(),
    })
}

/// Force the VRM content type on `.vrm` downloads
async fn vrm_content_type(request: Request, next: Next) -> Response {
    let is_vrm = request.uri().path().ends_with(".vrm");
    let mut response = next.run(request).await;
    if is_vrm && response.status().is_success() {
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(VRM_CONTENT_TYPE),
        );
    }
    response
}

/// Create the relay router
pub fn create_router(state: Arc<RelayState>, static_dir: &Path) -> Router {
    let static_files =
        ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/health", get(health))
        .fallback_service(static_files)
        .layer(middleware::from_fn(vrm_content_type))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The relay HTTP service
pub struct RelayServer {
    config: RelayConfig,
    router: Router,
}

impl RelayServer {
    /// Build the service from resolved configuration
    ///
    /// # Errors
    ///
    /// Fails if the upstream HTTP client cannot be built.
    pub fn new(config: RelayConfig) -> Result<Self, BackendError> {
        let state = Arc::new(RelayState::from_config(&config)?);
        let router = create_router(state, &config.static_dir);
        Ok(Self { config, router })
    }

    /// Router for in-process use
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind the configured address and serve until `shutdown` resolves
    ///
    /// # Errors
    ///
    /// Fails if the address cannot be bound or the server stops with an
    /// IO error.
    pub async fn run<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves
    ///
    /// # Errors
    ///
    /// Fails if the server stops with an IO error.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;
        info!(
            addr = %local_addr,
            character = %self.config.persona.name,
            static_dir = %self.config.static_dir.display(),
            "Relay listening"
        );
        if self.config.is_demo_mode() {
            info!("Upstream API: not configured (demo mode)");
        } else {
            info!(url = %self.config.upstream.api_url, model = %self.config.upstream.model, "Upstream API: configured");
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server error")?;

        info!("Relay stopped");
        Ok(())
    }
}
