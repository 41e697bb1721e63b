//! Chat Relay - persona-prompted chat proxy
//!
//! A small HTTP service that sits between the avatar front end and an
//! OpenAI-compatible completion API. It prepends a fixed persona
//! instruction to every conversation, keeps the API key server side, and
//! serves the built front end from a static directory.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  POST /api/chat   ┌──────────────┐  chat/completions  ┌──────────┐
//! │  Front end / │ ────────────────► │  chat-relay  │ ─────────────────► │ Upstream │
//! │  companion   │ ◄──────────────── │ (RelayState) │ ◄───────────────── │   API    │
//! └──────────────┘   {message}       └──────────────┘                    └──────────┘
//!                                           │ no API key
//!                                           ▼
//!                                      DemoBackend
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use chat_relay::{load_config, RelayServer};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = load_config()?;
//! RelayServer::new(config)?.run(async {
//!     let _ = tokio::signal::ctrl_c().await;
//! }).await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod error;
pub mod server;

pub use backend::{
    BackendError, ChatMessage, CompletionBackend, CompletionReply, CompletionRequest,
    DemoBackend, OpenAiBackend,
};
pub use config::{
    default_config_path, load_config, load_config_from_path, load_config_with_env,
    ConfigError, ConfigOverrides, ConfigSource, Persona, RelayConfig, UpstreamConfig,
};
pub use error::RelayError;
pub use server::{create_router, ChatResponse, HealthResponse, RelayServer, RelayState};
