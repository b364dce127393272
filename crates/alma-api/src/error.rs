//! API error types and JSON error response formatting.
//!
//! ApiError provides a consistent JSON error response format across all
//! endpoints, mapping internal errors to appropriate HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use alma_chat::ChatError;
use alma_core::AlmaError;

/// Friendly failure text shown when a chat turn dies on an internal error.
pub const CHAT_FAILURE_MESSAGE: &str = "Something went wrong, want to try again?";

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    BadRequest(String),
    /// 404 Not Found - resource does not exist.
    NotFound(String),
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
    /// 503 Service Unavailable - upstream provider not reachable.
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg)
            }
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<AlmaError> for ApiError {
    fn from(err: AlmaError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyMessage | ChatError::MissingUserId | ChatError::MessageTooLong(_) => {
                ApiError::BadRequest(err.to_string())
            }
            ChatError::SessionNotFound(_) => ApiError::NotFound(err.to_string()),
            ChatError::Generation(_) | ChatError::Storage(_) => {
                ApiError::Internal(CHAT_FAILURE_MESSAGE.to_string())
            }
        }
    }
}
