//! Chat Session
//!
//! Conversation history sent with every relay request. The history keeps
//! only the most recent [`MAX_HISTORY`] turns, trimmed after each
//! assistant reply, and at most one request may be in flight.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Turns kept after each assistant reply
pub const MAX_HISTORY: usize = 20;

/// Who wrote a turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing
    User,
    /// The avatar
    Assistant,
}

/// One conversation turn, serialised as `{role, content}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author
    pub role: Role,
    /// Text
    pub content: String,
}

impl Message {
    /// User turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Why a send was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendRejected {
    /// Input was empty after trimming
    #[error("message is empty")]
    Blank,
    /// A previous request has not finished
    #[error("still waiting for the previous reply")]
    InFlight,
}

/// Conversation state for one companion
#[derive(Debug, Default)]
pub struct ChatSession {
    history: Vec<Message>,
    in_flight: bool,
}

impl ChatSession {
    /// Empty session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a user turn and mark a request in flight
    ///
    /// Returns the history to send, ending with the new turn.
    ///
    /// # Errors
    ///
    /// [`SendRejected::Blank`] for whitespace-only input,
    /// [`SendRejected::InFlight`] while a reply is pending. Neither changes
    /// the session.
    pub fn begin(&mut self, text: &str) -> Result<Vec<Message>, SendRejected> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SendRejected::Blank);
        }
        if self.in_flight {
            return Err(SendRejected::InFlight);
        }

        self.history.push(Message::user(text));
        self.in_flight = true;
        Ok(self.history.clone())
    }

    /// Record the assistant reply and release the in-flight guard
    pub fn complete(&mut self, reply: impl Into<String>) {
        self.history.push(Message::assistant(reply));
        if self.history.len() > MAX_HISTORY {
            let excess = self.history.len() - MAX_HISTORY;
            self.history.drain(..excess);
        }
        self.in_flight = false;
    }

    /// Release the in-flight guard after a failed request
    ///
    /// The user turn stays in history so the next request carries it.
    pub fn fail(&mut self) {
        self.in_flight = false;
    }

    /// Whether a request is pending
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Current history, oldest first
    #[must_use]
    pub fn history(&self) -> &[Message] {
        &self.history
    }
}
