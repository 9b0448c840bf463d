//! API error types and response formatting.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::common::error::QueueError;

/// Errors surfaced synchronously to the yelling game server.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing, malformed or unknown credential.
    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),

    /// Bad body, blank message or unknown server name.
    #[error("{0}")]
    Validation(String),

    /// The destination channel is not available in Discord.
    #[error("Discord channel not found for server: {0}")]
    Resolution(String),

    /// The delivery queue is at capacity.
    #[error(transparent)]
    Backpressure(#[from] QueueError),

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Anything unexpected while handling the request.
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Resolution(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Backpressure(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

/// JSON error response body.
#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(err) => tracing::error!(error = ?err, "Error processing yell"),
            Self::Resolution(server) => {
                tracing::error!(server = %server, "Discord channel not found")
            }
            Self::Backpressure(err) => tracing::warn!("Rejecting yell: {}", err),
            _ => tracing::debug!("Rejecting yell: {}", self),
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
