//! Client for OpenAI-compatible API endpoints.
//!
//! Implements both `LanguageModel` (chat completions) and `SpeechModel`
//! (speech synthesis and transcription) against any endpoint that speaks the
//! OpenAI wire format. The base URL is configurable, so this also covers
//! self-hosted gateways that expose the same routes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LlmError, Result};
use crate::{
    ChatMessage, ChatRequest, Completion, LanguageModel, MessageRole, SpeechModel, TokenUsage,
};

// ============================================================================
// Configuration
// ============================================================================

/// Connection settings for an OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAiConfig {
    /// Base URL, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer token. `None` for local endpoints that skip auth.
    pub api_key: Option<String>,
    /// Model used when a request does not name one.
    pub chat_model: String,
    /// Speech synthesis model.
    pub tts_model: String,
    /// Synthesis voice name.
    pub tts_voice: String,
    /// Transcription model.
    pub stt_model: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            chat_model: "gpt-4o".to_string(),
            tts_model: "tts-1-hd".to_string(),
            tts_voice: "nova".to_string(),
            stt_model: "whisper-1".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

// Keep the API key out of debug output.
impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("chat_model", &self.chat_model)
            .field("tts_model", &self.tts_model)
            .field("tts_voice", &self.tts_voice)
            .field("stt_model", &self.stt_model)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Client
// ============================================================================

/// HTTP client for an OpenAI-compatible provider.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LlmError::Provider(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    fn add_auth_header(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.api_key.as_deref() {
            Some(key) if !key.is_empty() => builder.bearer_auth(key),
            _ => builder,
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Completion> {
        let body = OpenAiRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.config.chat_model.clone()),
            messages: request.messages.iter().map(OpenAiMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(
            model = %body.model,
            messages = body.messages.len(),
            "sending chat completion request"
        );

        let response = self
            .add_auth_header(self.client.post(self.api_url("chat/completions")))
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(parse_error_response(status, response).await);
        }

        let parsed: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Parse("no choices in response".to_string()))?;

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            model: parsed.model,
            usage: parsed.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }
}

#[async_trait]
impl SpeechModel for OpenAiClient {
    async fn synthesize(&self, text: &str, _language: &str) -> Result<Vec<u8>> {
        let body = SpeechRequest {
            model: &self.config.tts_model,
            voice: &self.config.tts_voice,
            input: text,
            response_format: "mp3",
        };

        debug!(model = %self.config.tts_model, chars = text.len(), "sending speech request");

        let response = self
            .add_auth_header(self.client.post(self.api_url("audio/speech")))
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(parse_error_response(status, response).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LlmError::Provider(format!("failed to read audio body: {e}")))?;
        Ok(bytes.to_vec())
    }

    async fn transcribe(&self, audio: Vec<u8>, filename: &str, language: &str) -> Result<String> {
        let part = Part::bytes(audio)
            .file_name(filename.to_string())
            .mime_str(audio_mime(filename))
            .map_err(|e| LlmError::InvalidRequest(e.to_string()))?;

        let mut form = Form::new()
            .part("file", part)
            .text("model", self.config.stt_model.clone())
            .text("response_format", "text");
        if !language.is_empty() {
            form = form.text("language", language.to_string());
        }

        debug!(model = %self.config.stt_model, %filename, "sending transcription request");

        let response = self
            .add_auth_header(self.client.post(self.api_url("audio/transcriptions")))
            .multipart(form)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(parse_error_response(status, response).await);
        }

        let text = response
            .text()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;
        Ok(text.trim().to_string())
    }
}

// ============================================================================
// Error Mapping
// ============================================================================

fn map_send_error(e: reqwest::Error) -> LlmError {
    if e.is_connect() || e.is_timeout() {
        LlmError::Unavailable(e.to_string())
    } else {
        LlmError::Provider(e.to_string())
    }
}

/// Extract the provider's error message from a failed response and classify
/// it by status. Falls back to the raw body when it is not the standard JSON
/// error envelope (gateways tend to return plain text for 502/504).
async fn parse_error_response(status: StatusCode, response: Response) -> LlmError {
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<OpenAiErrorResponse>(&body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.is_empty() => format!("HTTP {status}"),
        Err(_) => body,
    };
    error_for_status(status, message)
}

fn error_for_status(status: StatusCode, message: String) -> LlmError {
    match status.as_u16() {
        401 | 403 => LlmError::Auth(message),
        429 => LlmError::RateLimited(message),
        400 => LlmError::InvalidRequest(message),
        404 => LlmError::NotFound(message),
        500..=599 => LlmError::Unavailable(message),
        _ => LlmError::Provider(format!("HTTP {status}: {message}")),
    }
}

/// Guess the MIME type from the uploaded filename. Transcription endpoints
/// key off the extension, so octet-stream is a safe fallback.
fn audio_mime(filename: &str) -> &'static str {
    match filename.rsplit('.').next().map(str::to_ascii_lowercase) {
        Some(ext) if ext == "mp3" => "audio/mpeg",
        Some(ext) if ext == "wav" => "audio/wav",
        Some(ext) if ext == "webm" => "audio/webm",
        Some(ext) if ext == "ogg" => "audio/ogg",
        Some(ext) if ext == "flac" => "audio/flac",
        Some(ext) if ext == "m4a" || ext == "mp4" => "audio/mp4",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: String,
}

impl From<&ChatMessage> for OpenAiMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: match msg.role {
                MessageRole::System => "system",
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            },
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    model: String,
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

// ============================================================================
// Tests
// ============================================================================
