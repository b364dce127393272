use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Behavioral setting for a conversation.
///
/// Governs the prompt instructions sent to the language model and, for
/// `Quiet`, an additional respond-or-stay-silent gate before any reply
/// is produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationMode {
    /// User has a question or dilemma; direct, solution-focused replies.
    #[default]
    Ask,
    /// User is processing emotions; supportive, clarity-seeking replies.
    Reflect,
    /// User is thinking; reply only when explicitly asked, briefly.
    Quiet,
}

impl ConversationMode {
    /// Returns the lowercase wire name ("ask", "reflect", "quiet").
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationMode::Ask => "ask",
            ConversationMode::Reflect => "reflect",
            ConversationMode::Quiet => "quiet",
        }
    }
}

/// Author of a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The human participant.
    User,
    /// The assistant's reply (empty content for a silent quiet-mode turn).
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Mutation applied to a session's memory via the memory endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MemoryAction {
    /// Flip memory recording on or off.
    Toggle,
    /// Flip private mode; entering private mode drops the context window.
    TogglePrivate,
    /// Drop the context window and record when it happened.
    Clear,
}

impl MemoryAction {
    /// Parse the wire spelling of an action. `None` for anything unknown.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "toggle" => Some(MemoryAction::Toggle),
            "togglePrivate" => Some(MemoryAction::TogglePrivate),
            "clear" => Some(MemoryAction::Clear),
            _ => None,
        }
    }
}

// =============================================================================
// Entity Structs
// =============================================================================

/// Maximum number of recent message contents retained in session memory.
pub const CONTEXT_WINDOW: usize = 10;

/// One message within a session, chronological by `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Mode active when the message was produced, kept for history display.
    pub mode: ConversationMode,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>, mode: ConversationMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            mode,
        }
    }
}

/// Sliding window of recent message contents fed back into future prompts.
///
/// Invariant: `context.len() <= CONTEXT_WINDOW` at all times. Entering
/// private mode empties `context` in the same update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMemory {
    /// When false, new message contents are not recorded.
    pub is_active: bool,
    /// When true, nothing is recorded and the window stays empty.
    pub is_private: bool,
    pub context: Vec<String>,
    /// Time of the last explicit clear, if any.
    pub last_cleared: Option<DateTime<Utc>>,
}

impl Default for SessionMemory {
    fn default() -> Self {
        Self {
            is_active: true,
            is_private: false,
            context: Vec::new(),
            last_cleared: None,
        }
    }
}

impl SessionMemory {
    /// Records a message content into the window, dropping the oldest
    /// entries beyond `CONTEXT_WINDOW`. No-op while inactive or private.
    /// Empty contents (silent assistant turns) are not recorded.
    pub fn record(&mut self, content: &str) {
        if !self.is_active || self.is_private || content.is_empty() {
            return;
        }
        self.context.push(content.to_string());
        while self.context.len() > CONTEXT_WINDOW {
            self.context.remove(0);
        }
    }

    pub fn toggle_active(&mut self) {
        self.is_active = !self.is_active;
    }

    /// Flips private mode. Entering private mode drops the window as part
    /// of the same mutation; leaving it does not restore anything.
    pub fn toggle_private(&mut self) {
        self.is_private = !self.is_private;
        if self.is_private {
            self.context.clear();
        }
    }

    pub fn clear(&mut self) {
        self.context.clear();
        self.last_cleared = Some(Utc::now());
    }
}

/// A persisted conversation between one user and the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub user_id: String,
    /// None until first assigned; an empty string is a valid explicit title.
    pub title: Option<String>,
    pub messages: Vec<Message>,
    pub mode: ConversationMode,
    pub memory: SessionMemory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            title,
            messages: Vec::new(),
            mode: ConversationMode::default(),
            memory: SessionMemory::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Turn Outcome
// =============================================================================

/// Result of orchestrating one assistant turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    /// Full reply text; empty for a silent quiet-mode turn.
    pub content: String,
    pub mode: ConversationMode,
    pub memory_updated: bool,
    /// Up to 3 short user-voiced follow-up prompts; empty for silent turns.
    pub suggestions: Vec<String>,
    /// True when the quiet-mode gate chose not to respond.
    pub silent: bool,
    /// Gate reasoning for a silent turn, kept for observability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl TurnOutcome {
    pub fn reply(content: String, mode: ConversationMode, suggestions: Vec<String>) -> Self {
        Self {
            content,
            mode,
            memory_updated: true,
            suggestions,
            silent: false,
            reasoning: None,
        }
    }

    pub fn silent(mode: ConversationMode, reasoning: Option<String>) -> Self {
        Self {
            content: String::new(),
            mode,
            memory_updated: true,
            suggestions: Vec::new(),
            silent: true,
            reasoning,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
