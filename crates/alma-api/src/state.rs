//! Application state shared across all route handlers.
//!
//! AppState holds references to the chat service, session manager, and
//! speech provider. It is passed to handlers via axum's State extractor.

use std::sync::Arc;
use std::time::Instant;

use alma_chat::{ChatService, SessionManager};
use alma_core::AlmaConfig;
use alma_llm::SpeechModel;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AlmaConfig>,
    /// Session lifecycle and memory mutations.
    pub sessions: Arc<SessionManager>,
    /// The chat turn use case.
    pub chat: Arc<ChatService>,
    /// Speech synthesis and transcription provider.
    pub speech: Arc<dyn SpeechModel>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: AlmaConfig,
        sessions: Arc<SessionManager>,
        chat: ChatService,
        speech: Arc<dyn SpeechModel>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            sessions,
            chat: Arc::new(chat),
            speech,
            start_time: Instant::now(),
        }
    }
}
