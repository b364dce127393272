//! Language model provider abstraction.
//!
//! - `LanguageModel` is the text-completion capability consumed by the chat
//!   orchestrator. `OpenAiClient` is the production implementation backed by
//!   any OpenAI-compatible endpoint; `ScriptedModel` returns canned replies
//!   for testing.
//! - `SpeechModel` covers speech synthesis and transcription, implemented by
//!   the same `OpenAiClient` and by `ScriptedSpeech` for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod error;
pub mod mock;
pub mod openai;

pub use error::{LlmError, Result};
pub use mock::{ScriptedModel, ScriptedSpeech};
pub use openai::{OpenAiClient, OpenAiConfig};

// ============================================================================
// Request / Response Types
// ============================================================================

/// Role of a message in a completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions that steer the model.
    System,
    /// Input from the end user.
    User,
    /// A previous model reply.
    Assistant,
}

impl MessageRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A single message in a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// A chat completion request.
///
/// `model`, `temperature`, and `max_tokens` fall back to provider defaults
/// when unset.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// The collected result of a completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// Full reply text.
    pub content: String,
    /// Model that actually served the request.
    pub model: String,
    /// Token usage, when the provider reports it.
    pub usage: Option<TokenUsage>,
    /// Why generation stopped (e.g. "stop", "length").
    pub finish_reason: Option<String>,
}

/// Token usage reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

// ============================================================================
// Capability Traits
// ============================================================================

/// Text completion capability.
///
/// The orchestrator treats the provider as a black box: given messages,
/// produce the full reply text. Structured sub-decisions (gate checks,
/// suggestions, titles) go through the same call with prompts that request
/// JSON output; parsing happens on the caller's side.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Short provider name for logging.
    fn name(&self) -> &str;

    /// Run a chat completion and return the collected result.
    async fn complete(&self, request: &ChatRequest) -> Result<Completion>;
}

/// Speech synthesis and transcription capability.
#[async_trait]
pub trait SpeechModel: Send + Sync {
    /// Synthesize speech for the given text, returning encoded audio bytes
    /// (mp3). The language tag is advisory; voices detect the input language.
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>>;

    /// Transcribe audio bytes to text. The filename hints at the container
    /// format; the language tag conditions recognition.
    async fn transcribe(&self, audio: Vec<u8>, filename: &str, language: &str) -> Result<String>;
}

// ============================================================================
// Tests
// ============================================================================
