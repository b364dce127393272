//! Session lifecycle and mutation.
//!
//! All writes to a session go through `SessionManager` so the memory-window
//! and timestamp invariants are enforced in one place. Reads on a missing
//! session return `None`; writes on a missing session are no-ops, and the
//! caller decides whether that deserves a not-found error.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use alma_core::{AlmaError, ConversationMode, MemoryAction, Message, Session, SessionMemory};
use alma_store::{Database, SessionRepository};

type Result<T> = std::result::Result<T, AlmaError>;

/// Sole owner of session mutation logic.
pub struct SessionManager {
    repo: SessionRepository,
}

impl SessionManager {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            repo: SessionRepository::new(db),
        }
    }

    /// Create and persist a fresh session for a user.
    pub fn create_session(&self, user_id: &str, title: Option<String>) -> Result<Session> {
        let session = Session::new(user_id, title);
        self.repo.insert(&session)?;
        debug!(session_id = %session.id, user_id, "created session");
        Ok(session)
    }

    pub fn get_session(&self, session_id: Uuid) -> Result<Option<Session>> {
        self.repo.find_by_id(session_id)
    }

    /// Append a message, record its content in the memory window, and bump
    /// `updated_at`. Returns the updated session, or `None` if it does not
    /// exist.
    pub fn add_message(&self, session_id: Uuid, message: Message) -> Result<Option<Session>> {
        let Some(mut session) = self.repo.find_by_id(session_id)? else {
            return Ok(None);
        };
        session.memory.record(&message.content);
        session.messages.push(message);
        session.updated_at = Utc::now();
        self.repo.update(&session)?;
        Ok(Some(session))
    }

    pub fn update_mode(&self, session_id: Uuid, mode: ConversationMode) -> Result<()> {
        let Some(mut session) = self.repo.find_by_id(session_id)? else {
            return Ok(());
        };
        session.mode = mode;
        session.updated_at = Utc::now();
        self.repo.update(&session)
    }

    /// Set the title. An empty string is a valid explicit title, distinct
    /// from the unset `None`.
    pub fn update_title(&self, session_id: Uuid, title: &str) -> Result<()> {
        let Some(mut session) = self.repo.find_by_id(session_id)? else {
            return Ok(());
        };
        session.title = Some(title.to_string());
        session.updated_at = Utc::now();
        self.repo.update(&session)
    }

    /// Flip whether new message content is recorded in the memory window.
    pub fn toggle_memory(&self, session_id: Uuid) -> Result<Option<SessionMemory>> {
        self.mutate_memory(session_id, SessionMemory::toggle_active)
    }

    /// Flip private mode. Entering private mode clears the window.
    pub fn toggle_private_mode(&self, session_id: Uuid) -> Result<Option<SessionMemory>> {
        self.mutate_memory(session_id, SessionMemory::toggle_private)
    }

    /// Empty the window and stamp `last_cleared`.
    pub fn clear_memory(&self, session_id: Uuid) -> Result<Option<SessionMemory>> {
        self.mutate_memory(session_id, SessionMemory::clear)
    }

    /// Dispatch one of the wire-level memory actions.
    pub fn apply_memory_action(
        &self,
        session_id: Uuid,
        action: MemoryAction,
    ) -> Result<Option<SessionMemory>> {
        match action {
            MemoryAction::Toggle => self.toggle_memory(session_id),
            MemoryAction::TogglePrivate => self.toggle_private_mode(session_id),
            MemoryAction::Clear => self.clear_memory(session_id),
        }
    }

    pub fn memory_status(&self, session_id: Uuid) -> Result<Option<SessionMemory>> {
        Ok(self.repo.find_by_id(session_id)?.map(|s| s.memory))
    }

    /// Hard delete. Returns whether a record existed; deleting twice is safe.
    pub fn delete_session(&self, session_id: Uuid) -> Result<bool> {
        let deleted = self.repo.delete(session_id)?;
        if deleted {
            debug!(session_id = %session_id, "deleted session");
        }
        Ok(deleted)
    }

    /// All sessions for a user, most recently updated first.
    pub fn user_sessions(&self, user_id: &str) -> Result<Vec<Session>> {
        self.repo.list_for_user(user_id)
    }

    fn mutate_memory(
        &self,
        session_id: Uuid,
        apply: impl FnOnce(&mut SessionMemory),
    ) -> Result<Option<SessionMemory>> {
        let Some(mut session) = self.repo.find_by_id(session_id)? else {
            return Ok(None);
        };
        apply(&mut session.memory);
        session.updated_at = Utc::now();
        self.repo.update(&session)?;
        Ok(Some(session.memory))
    }
}
