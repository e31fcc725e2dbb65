//! Web error types for the packserve HTTP server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::pack::PackFailure;

/// Error type for web API operations.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request with validation error.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The pack build failed; the message is reported to the client.
    #[error("Pack failed: {0}")]
    PackFailed(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match &self {
            WebError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not Found", Some(msg.clone())),
            WebError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Bad Request", Some(msg.clone()))
            }
            WebError::PackFailed(msg) => {
                tracing::error!("Pack failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Pack Failed",
                    Some(msg.clone()),
                )
            }
            WebError::Internal(msg) => {
                tracing::error!("Internal server error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_message.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

impl From<PackFailure> for WebError {
    fn from(err: PackFailure) -> Self {
        match err {
            PackFailure::UnknownPackage(name) => {
                WebError::NotFound(format!("unknown package: {name}"))
            }
            PackFailure::InvalidNonce(nonce) => {
                WebError::BadRequest(format!("invalid nonce: {nonce:?}"))
            }
            PackFailure::Build(err) => WebError::PackFailed(err.to_string()),
        }
    }
}

impl From<std::io::Error> for WebError {
    fn from(err: std::io::Error) -> Self {
        WebError::Internal(err.to_string())
    }
}
