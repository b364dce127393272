//! The single externally visible chat use case: take one user turn and
//! produce one assistant turn, composing session lifecycle, orchestration,
//! and best-effort title generation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use alma_core::{AlmaConfig, ConversationMode, Message, Role, SessionMemory};
use alma_llm::{ChatMessage, ChatRequest, LanguageModel};

use crate::error::{ChatError, Result};
use crate::orchestrator::Orchestrator;
use crate::sessions::SessionManager;

const TITLE_PROMPT: &str = "Generate a concise, 3-5 word title for a conversation that starts with the following message. Return only the title, nothing else.";
const TITLE_TEMPERATURE: f32 = 0.7;
const TITLE_MAX_TOKENS: u32 = 20;
const DEFAULT_TITLE: &str = "New Conversation";

/// One inbound chat turn. `message` and `user_id` default to empty so a
/// missing field surfaces as a validation error instead of a decode failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub mode: Option<ConversationMode>,
    #[serde(default)]
    pub language: Option<String>,
}

/// The completed turn returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnReply {
    /// The assistant message as persisted, empty content for silent turns.
    pub message: Message,
    pub session_id: Uuid,
    pub mode: ConversationMode,
    pub suggestions: Vec<String>,
    pub memory_status: SessionMemory,
}

/// Composes the session manager and orchestrator into the chat use case.
pub struct ChatService {
    sessions: Arc<SessionManager>,
    orchestrator: Orchestrator,
    model: Arc<dyn LanguageModel>,
    title_model: String,
    max_message_length: usize,
}

impl ChatService {
    pub fn new(
        sessions: Arc<SessionManager>,
        model: Arc<dyn LanguageModel>,
        config: &AlmaConfig,
    ) -> Self {
        Self {
            sessions,
            orchestrator: Orchestrator::new(Arc::clone(&model), &config.llm, &config.chat),
            model,
            title_model: config.llm.title_model.clone(),
            max_message_length: config.chat.max_message_length,
        }
    }

    pub async fn handle_turn(&self, request: TurnRequest) -> Result<TurnReply> {
        if request.user_id.trim().is_empty() {
            return Err(ChatError::MissingUserId);
        }
        if request.message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if request.message.chars().count() > self.max_message_length {
            return Err(ChatError::MessageTooLong(self.max_message_length));
        }

        // An absent or unknown session id starts a fresh session for the user.
        let existing = match request.session_id {
            Some(id) => self.sessions.get_session(id)?,
            None => None,
        };
        let is_new = existing.is_none();
        let session = match existing {
            Some(session) => session,
            None => self.sessions.create_session(&request.user_id, None)?,
        };
        let session_id = session.id;

        let mode = request.mode.unwrap_or(session.mode);

        let user_message = Message::new(Role::User, request.message.clone(), mode);
        let session = self
            .sessions
            .add_message(session_id, user_message)?
            .ok_or(ChatError::SessionNotFound(session_id))?;

        if mode != session.mode {
            self.sessions.update_mode(session_id, mode)?;
        }

        let outcome = self
            .orchestrator
            .respond(&session.messages, mode, request.language.as_deref())
            .await?;

        let assistant_message = Message::new(Role::Assistant, outcome.content.clone(), mode);
        let session = self
            .sessions
            .add_message(session_id, assistant_message.clone())?
            .ok_or(ChatError::SessionNotFound(session_id))?;

        if is_new {
            let title = self.generate_title(&request.message).await;
            self.sessions.update_title(session_id, &title)?;
        }

        debug!(
            session_id = %session_id,
            mode = mode.as_str(),
            silent = outcome.silent,
            "turn complete"
        );

        Ok(TurnReply {
            message: assistant_message,
            session_id,
            mode: outcome.mode,
            suggestions: outcome.suggestions,
            memory_status: session.memory,
        })
    }

    /// Derive a short title from the first user message. Best-effort; any
    /// failure falls back to a fixed default and never blocks the turn.
    async fn generate_title(&self, first_message: &str) -> String {
        let request = ChatRequest::new(vec![
            ChatMessage::system(TITLE_PROMPT),
            ChatMessage::user(first_message),
        ])
        .with_model(self.title_model.clone())
        .with_temperature(TITLE_TEMPERATURE)
        .with_max_tokens(TITLE_MAX_TOKENS);

        match self.model.complete(&request).await {
            Ok(completion) => {
                let title = completion.content.trim().to_string();
                if title.is_empty() {
                    DEFAULT_TITLE.to_string()
                } else {
                    title
                }
            }
            Err(e) => {
                warn!(error = %e, "title generation failed, using default");
                DEFAULT_TITLE.to_string()
            }
        }
    }
}
