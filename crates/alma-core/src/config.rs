use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AlmaError, Result};

/// Top-level configuration for the Alma application.
///
/// Loaded from `~/.alma/config.toml` by default. Each section corresponds
/// to a bounded context or cross-cutting concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlmaConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl Default for AlmaConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            llm: LlmConfig::default(),
            voice: VoiceConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

impl AlmaConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AlmaConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| AlmaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the SQLite session store.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.alma/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
        }
    }
}

/// Language model provider settings.
///
/// The API key is never stored here; it is read from the `OPENAI_API_KEY`
/// environment variable at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Model used for the primary chat completion.
    pub chat_model: String,
    /// Smaller model used for conversation title generation.
    pub title_model: String,
    /// Token cap for the primary completion.
    pub max_tokens: u32,
    /// Sampling temperature for the primary completion.
    pub temperature: f32,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4o".to_string(),
            title_model: "gpt-4o-mini".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            connect_timeout_secs: 10,
            request_timeout_secs: 60,
        }
    }
}

/// Speech synthesis and transcription settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Text-to-speech model.
    pub tts_model: String,
    /// Text-to-speech voice name.
    pub tts_voice: String,
    /// Speech-to-text model.
    pub stt_model: String,
    /// Fallback language tag when a request does not specify one.
    pub default_language: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            tts_model: "tts-1-hd".to_string(),
            tts_voice: "nova".to_string(),
            stt_model: "whisper-1".to_string(),
            default_language: "en".to_string(),
        }
    }
}

/// Conversation behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum accepted user message length in characters.
    pub max_message_length: usize,
    /// Maximum follow-up suggestions returned per turn.
    pub max_suggestions: usize,
    /// Whether follow-up suggestions are generated at all.
    pub enable_suggestions: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: 2000,
            max_suggestions: 3,
            enable_suggestions: true,
        }
    }
}
