//! Alma application binary - composition root.
//!
//! Ties together all Alma crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Open the SQLite session store
//! 3. Build the OpenAI-backed chat service and orchestrator
//! 4. Start the axum REST API server

mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use alma_api::AppState;
use alma_chat::{ChatService, SessionManager};
use alma_core::AlmaConfig;
use alma_llm::{OpenAiClient, OpenAiConfig};
use alma_store::Database;

use cli::CliArgs;

/// Expand ~ to home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> std::path::PathBuf {
    if data_dir.starts_with("~/") || data_dir.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        std::path::PathBuf::from(home).join(&data_dir[2..])
    } else {
        std::path::PathBuf::from(data_dir)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Tracing.
    let default_level = args
        .resolve_log_level()
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    tracing::info!("Starting Alma v{}", env!("CARGO_PKG_VERSION"));

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = AlmaConfig::load_or_default(&config_file);
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    config.server.port = args.resolve_port(config.server.port);
    if let Some(dir) = args.resolve_data_dir() {
        config.general.data_dir = dir;
    }

    // Storage.
    let data_dir = resolve_data_dir(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }

    let db_path = data_dir.join("alma.db");
    let db = Arc::new(Database::new(&db_path)?);
    tracing::info!(path = %db_path.display(), "SQLite session store opened");

    // Provider client. The API key comes from the environment, never the
    // config file.
    let api_key = std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|k| !k.is_empty());
    if api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; provider calls will fail");
    }
    let provider = Arc::new(OpenAiClient::new(OpenAiConfig {
        base_url: config.llm.base_url.clone(),
        api_key,
        chat_model: config.llm.chat_model.clone(),
        tts_model: config.voice.tts_model.clone(),
        tts_voice: config.voice.tts_voice.clone(),
        stt_model: config.voice.stt_model.clone(),
        connect_timeout: Duration::from_secs(config.llm.connect_timeout_secs),
        request_timeout: Duration::from_secs(config.llm.request_timeout_secs),
    })?);
    tracing::info!(model = %config.llm.chat_model, "Provider client ready");

    // Chat service over the shared session store.
    let sessions = Arc::new(SessionManager::new(db));
    let chat = ChatService::new(Arc::clone(&sessions), provider.clone(), &config);

    let state = AppState::new(config, sessions, chat, provider);

    // API server (blocks until shutdown).
    alma_api::start_server(state).await?;

    Ok(())
}
