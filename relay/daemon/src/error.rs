//! HTTP error responses
//!
//! Every failure of `POST /api/chat` becomes a JSON body `{error, details?}`
//! with a status code chosen here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::backend::BackendError;

/// Errors surfaced to relay clients
#[derive(Debug, Error)]
pub enum RelayError {
    /// Body missing, not JSON, or `messages` absent / not an array
    #[error("messages is required")]
    MissingMessages,

    /// Upstream answered with a non-success status
    #[error("API request failed")]
    Upstream {
        /// Status passed through to the client
        status: StatusCode,
        /// Upstream response body
        details: String,
    },

    /// Transport or decode failure talking to upstream
    #[error("Internal server error")]
    Internal(String),
}

impl RelayError {
    /// Status code sent to the client
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingMessages => StatusCode::BAD_REQUEST,
            Self::Upstream { status, .. } => *status,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BackendError> for RelayError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Upstream { status, body } => Self::Upstream {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                details: body,
            },
            other => Self::Internal(other.to_string()),
        }
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Short client-facing message
    pub error: String,
    /// Upstream body, for pass-through failures only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.to_string();
        let details = match self {
            Self::Upstream { details, .. } => Some(details),
            _ => None,
        };
        (status, Json(ErrorBody { error, details })).into_response()
    }
}
