//! Conversation layer: session lifecycle, mode policy, and turn
//! orchestration against a language model provider.

pub mod error;
pub mod modes;
pub mod orchestrator;
pub mod parser;
pub mod service;
pub mod sessions;

pub use error::ChatError;
pub use orchestrator::Orchestrator;
pub use service::{ChatService, TurnReply, TurnRequest};
pub use sessions::SessionManager;
