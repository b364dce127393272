//! Error types for provider calls.

use thiserror::Error;

/// Errors surfaced by language and speech model providers.
#[derive(Debug, Error)]
pub enum LlmError {
    /// API key missing or rejected (HTTP 401/403).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Provider throttled the request (HTTP 429).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The request was malformed or rejected (HTTP 400).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown model or endpoint (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Provider is down or unreachable (HTTP 5xx, connect failures).
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// Any other provider-side failure.
    #[error("provider error: {0}")]
    Provider(String),

    /// The provider responded but the body could not be decoded.
    #[error("failed to parse provider response: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;
