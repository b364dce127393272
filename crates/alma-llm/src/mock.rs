//! Scripted providers for tests.
//!
//! Deterministic stand-ins for the OpenAI client. `ScriptedModel` pops
//! queued replies in order and records every request it sees, so tests can
//! assert on the prompts the orchestrator builds. Kept outside `cfg(test)`
//! so downstream crates can use them in their own tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{LlmError, Result};
use crate::{ChatRequest, Completion, LanguageModel, SpeechModel};

/// A `LanguageModel` that replays queued replies.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a sequence of successful replies.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let model = Self::new();
        for reply in replies {
            model.push_reply(reply);
        }
        model
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.lock_replies().push_back(Ok(reply.into()));
    }

    pub fn push_error(&self, error: LlmError) {
        self.lock_replies().push_back(Err(error));
    }

    /// All requests seen so far, in call order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String>>> {
        self.replies
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Completion> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(request.clone());

        let reply = self
            .lock_replies()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Provider("no scripted reply queued".to_string())));

        reply.map(|content| Completion {
            content,
            model: "scripted".to_string(),
            usage: None,
            finish_reason: Some("stop".to_string()),
        })
    }
}

/// A `SpeechModel` with fixed outputs.
#[derive(Debug, Default)]
pub struct ScriptedSpeech {
    audio: Vec<u8>,
    transcription: String,
    fail: bool,
    spoken: Mutex<Vec<String>>,
}

impl ScriptedSpeech {
    pub fn new(audio: Vec<u8>, transcription: impl Into<String>) -> Self {
        Self {
            audio,
            transcription: transcription.into(),
            fail: false,
            spoken: Mutex::new(Vec::new()),
        }
    }

    /// A speech model whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Texts passed to `synthesize` so far.
    pub fn spoken(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SpeechModel for ScriptedSpeech {
    async fn synthesize(&self, text: &str, _language: &str) -> Result<Vec<u8>> {
        if self.fail {
            return Err(LlmError::Unavailable("scripted failure".to_string()));
        }
        self.spoken
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(text.to_string());
        Ok(self.audio.clone())
    }

    async fn transcribe(&self, _audio: Vec<u8>, _filename: &str, _language: &str) -> Result<String> {
        if self.fail {
            return Err(LlmError::Unavailable("scripted failure".to_string()));
        }
        Ok(self.transcription.clone())
    }
}
