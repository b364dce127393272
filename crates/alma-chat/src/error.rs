//! Error types for the conversation layer.

use thiserror::Error;
use uuid::Uuid;

use alma_core::AlmaError;
use alma_llm::LlmError;

/// Errors surfaced while handling a chat turn.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The request carried no message text.
    #[error("message cannot be empty")]
    EmptyMessage,

    /// The request carried no user id.
    #[error("userId is required")]
    MissingUserId,

    /// The message exceeds the configured length cap.
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),

    /// The session id does not exist.
    #[error("session not found: {0}")]
    SessionNotFound(Uuid),

    /// The main generation call failed. Fatal for the turn; gate and
    /// suggestion failures are absorbed instead.
    #[error("generation failed: {0}")]
    Generation(String),

    /// The session store rejected a read or write.
    #[error("session store error: {0}")]
    Storage(String),
}

impl From<AlmaError> for ChatError {
    fn from(err: AlmaError) -> Self {
        ChatError::Storage(err.to_string())
    }
}

impl From<LlmError> for ChatError {
    fn from(err: LlmError) -> Self {
        ChatError::Generation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
