//! Repository implementation for SQLite-backed session persistence.
//!
//! Provides SessionRepository operating on the Database struct using raw
//! SQL. Messages and memory are stored as JSON blobs in the session row.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use alma_core::error::AlmaError;
use alma_core::types::{ConversationMode, Message, Session, SessionMemory};

use crate::db::Database;

/// Repository for conversation sessions.
///
/// Writes are single-row read-modify-write operations with no cross-request
/// locking; concurrent updates to the same session are last-write-wins.
pub struct SessionRepository {
    db: Arc<Database>,
}

impl SessionRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store a newly created session.
    pub fn insert(&self, session: &Session) -> Result<(), AlmaError> {
        let messages = serde_json::to_string(&session.messages)?;
        let memory = serde_json::to_string(&session.memory)?;

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, user_id, title, messages, mode, memory, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    session.id.to_string(),
                    session.user_id,
                    session.title,
                    messages,
                    session.mode.as_str(),
                    memory,
                    session.created_at.timestamp_millis(),
                    session.updated_at.timestamp_millis(),
                ],
            )
            .map_err(|e| AlmaError::Storage(format!("Failed to insert session: {}", e)))?;
            Ok(())
        })
    }

    /// Persist the current state of an existing session.
    ///
    /// Updating a session that no longer exists affects zero rows and is
    /// not an error.
    pub fn update(&self, session: &Session) -> Result<(), AlmaError> {
        let messages = serde_json::to_string(&session.messages)?;
        let memory = serde_json::to_string(&session.memory)?;

        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE sessions
                 SET title = ?2, messages = ?3, mode = ?4, memory = ?5, updated_at = ?6
                 WHERE id = ?1",
                rusqlite::params![
                    session.id.to_string(),
                    session.title,
                    messages,
                    session.mode.as_str(),
                    memory,
                    session.updated_at.timestamp_millis(),
                ],
            )
            .map_err(|e| AlmaError::Storage(format!("Failed to update session: {}", e)))?;
            Ok(())
        })
    }

    /// Find a session by ID.
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Session>, AlmaError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, user_id, title, messages, mode, memory, created_at, updated_at
                     FROM sessions WHERE id = ?1",
                )
                .map_err(|e| AlmaError::Storage(e.to_string()))?;

            let result = stmt
                .query_row(rusqlite::params![id.to_string()], |row| {
                    Ok(row_to_session(row))
                })
                .optional()
                .map_err(|e| AlmaError::Storage(e.to_string()))?;

            match result {
                Some(session) => Ok(Some(session?)),
                None => Ok(None),
            }
        })
    }

    /// Delete a session by ID.
    ///
    /// Returns true if a row was deleted, false if none existed. Safe to
    /// call twice; the second call reports false.
    pub fn delete(&self, id: Uuid) -> Result<bool, AlmaError> {
        self.db.with_conn(|conn| {
            let affected = conn
                .execute(
                    "DELETE FROM sessions WHERE id = ?1",
                    rusqlite::params![id.to_string()],
                )
                .map_err(|e| AlmaError::Storage(format!("Failed to delete session: {}", e)))?;
            Ok(affected > 0)
        })
    }

    /// List all sessions for a user, most recently updated first.
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<Session>, AlmaError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, user_id, title, messages, mode, memory, created_at, updated_at
                     FROM sessions
                     WHERE user_id = ?1
                     ORDER BY updated_at DESC",
                )
                .map_err(|e| AlmaError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![user_id], |row| Ok(row_to_session(row)))
                .map_err(|e| AlmaError::Storage(e.to_string()))?;

            let mut sessions = Vec::new();
            for row in rows {
                let session = row.map_err(|e| AlmaError::Storage(e.to_string()))??;
                sessions.push(session);
            }
            Ok(sessions)
        })
    }

    /// Count total stored sessions.
    pub fn count(&self) -> Result<u64, AlmaError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
                .map_err(|e| AlmaError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }
}

// ============================================================================
// Helper functions for row-to-entity conversion.
// ============================================================================

fn row_to_session(row: &rusqlite::Row<'_>) -> Result<Session, AlmaError> {
    let id_str: String = row.get(0).map_err(|e| AlmaError::Storage(e.to_string()))?;
    let user_id: String = row.get(1).map_err(|e| AlmaError::Storage(e.to_string()))?;
    let title: Option<String> = row.get(2).map_err(|e| AlmaError::Storage(e.to_string()))?;
    let messages_json: String = row.get(3).map_err(|e| AlmaError::Storage(e.to_string()))?;
    let mode_str: String = row.get(4).map_err(|e| AlmaError::Storage(e.to_string()))?;
    let memory_json: String = row.get(5).map_err(|e| AlmaError::Storage(e.to_string()))?;
    let created_at_ms: i64 = row.get(6).map_err(|e| AlmaError::Storage(e.to_string()))?;
    let updated_at_ms: i64 = row.get(7).map_err(|e| AlmaError::Storage(e.to_string()))?;

    let messages: Vec<Message> = serde_json::from_str(&messages_json)?;
    let memory: SessionMemory = serde_json::from_str(&memory_json)?;

    let mode = match mode_str.as_str() {
        "ask" => ConversationMode::Ask,
        "reflect" => ConversationMode::Reflect,
        "quiet" => ConversationMode::Quiet,
        _ => ConversationMode::default(),
    };

    Ok(Session {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| AlmaError::Storage(format!("Invalid UUID: {}", e)))?,
        user_id,
        title,
        messages,
        mode,
        memory,
        created_at: Utc
            .timestamp_millis_opt(created_at_ms)
            .single()
            .unwrap_or_default(),
        updated_at: Utc
            .timestamp_millis_opt(updated_at_ms)
            .single()
            .unwrap_or_default(),
    })
}

/// Extension trait for rusqlite to support optional query results.
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
