//! Avatar Companion - terminal surface for the avatar
//!
//! Hosts an [`animator_core::AvatarAnimator`] on an in-memory rig, runs
//! its frame loop, and chats with the persona through the chat relay.
//!
//! - [`session`]: conversation history and in-flight guard
//! - [`client`]: HTTP client for the relay
//! - [`app`]: the `tokio::select!` loop tying input, replies and frames together

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod client;
pub mod session;

pub use app::{AppConfig, Command, CompanionApp, APOLOGY, TALK_HOLD};
pub use client::{extract_reply, Health, RelayClient};
pub use session::{ChatSession, Message, Role, SendRejected, MAX_HISTORY};
