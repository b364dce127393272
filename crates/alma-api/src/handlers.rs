//! Route handler functions for all API endpoints.
//!
//! Each handler extracts query/body parameters via axum extractors, calls
//! into the chat service or session manager, and returns JSON responses.
//! Wire field names are camelCase to match the UI contract.

use axum::extract::{Multipart, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use alma_chat::{ChatError, TurnReply, TurnRequest};
use alma_core::{MemoryAction, Session, SessionMemory};

use crate::error::{ApiError, CHAT_FAILURE_MESSAGE};
use crate::state::AppState;

// =============================================================================
// Request / query parameter types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationParams {
    pub user_id: Option<String>,
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConversationRequest {
    pub session_id: Option<Uuid>,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteConversationRequest {
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryActionRequest {
    pub session_id: Option<Uuid>,
    pub action: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryParams {
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub conversation: Session,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationsResponse {
    pub conversations: Vec<Session>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStatusResponse {
    pub memory_status: SessionMemory,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    pub transcription: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime: u64,
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET /api/health - liveness probe with version and uptime.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
    })
}

/// POST /api/chat - one user turn in, one assistant turn out.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<TurnRequest>,
) -> Result<Json<TurnReply>, ApiError> {
    let reply = state.chat.handle_turn(request).await.map_err(|e| match e {
        ChatError::Generation(detail) | ChatError::Storage(detail) => {
            error!(error = %detail, "chat turn failed");
            ApiError::Internal(CHAT_FAILURE_MESSAGE.to_string())
        }
        other => ApiError::from(other),
    })?;
    Ok(Json(reply))
}

/// GET /api/conversations - one conversation by sessionId, or all for a user.
pub async fn get_conversations(
    State(state): State<AppState>,
    Query(params): Query<ConversationParams>,
) -> Result<Response, ApiError> {
    if let Some(session_id) = params.session_id {
        let session = state
            .sessions
            .get_session(session_id)?
            .ok_or_else(|| ApiError::NotFound("Conversation not found".to_string()))?;
        return Ok(Json(ConversationResponse {
            conversation: session,
        })
        .into_response());
    }

    if let Some(user_id) = params.user_id {
        let sessions = state.sessions.user_sessions(&user_id)?;
        return Ok(Json(ConversationsResponse {
            conversations: sessions,
        })
        .into_response());
    }

    Err(ApiError::BadRequest(
        "userId or sessionId is required".to_string(),
    ))
}

/// PUT /api/conversations - update a conversation title.
pub async fn update_conversation(
    State(state): State<AppState>,
    Json(request): Json<UpdateConversationRequest>,
) -> Result<Json<AckResponse>, ApiError> {
    let session_id = request
        .session_id
        .ok_or_else(|| ApiError::BadRequest("sessionId is required".to_string()))?;
    let title = request
        .title
        .ok_or_else(|| ApiError::BadRequest("title is required".to_string()))?;

    if state.sessions.get_session(session_id)?.is_none() {
        return Err(ApiError::NotFound("Conversation not found".to_string()));
    }
    state.sessions.update_title(session_id, &title)?;
    Ok(Json(AckResponse { success: true }))
}

/// DELETE /api/conversations - hard delete a conversation.
pub async fn delete_conversation(
    State(state): State<AppState>,
    Json(request): Json<DeleteConversationRequest>,
) -> Result<Json<AckResponse>, ApiError> {
    let session_id = request
        .session_id
        .ok_or_else(|| ApiError::BadRequest("sessionId is required".to_string()))?;

    if !state.sessions.delete_session(session_id)? {
        return Err(ApiError::NotFound("Conversation not found".to_string()));
    }
    Ok(Json(AckResponse { success: true }))
}

/// POST /api/memory - apply a memory action and return the new status.
pub async fn memory_action(
    State(state): State<AppState>,
    Json(request): Json<MemoryActionRequest>,
) -> Result<Json<MemoryStatusResponse>, ApiError> {
    let (Some(session_id), Some(action)) = (request.session_id, request.action) else {
        return Err(ApiError::BadRequest(
            "sessionId and action are required".to_string(),
        ));
    };
    let Some(action) = MemoryAction::parse(&action) else {
        return Err(ApiError::BadRequest("Invalid action".to_string()));
    };

    let memory = state
        .sessions
        .apply_memory_action(session_id, action)?
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;
    Ok(Json(MemoryStatusResponse {
        memory_status: memory,
    }))
}

/// GET /api/memory - current memory status for a session.
pub async fn memory_status(
    State(state): State<AppState>,
    Query(params): Query<MemoryParams>,
) -> Result<Json<MemoryStatusResponse>, ApiError> {
    let session_id = params
        .session_id
        .ok_or_else(|| ApiError::BadRequest("sessionId is required".to_string()))?;

    let memory = state
        .sessions
        .memory_status(session_id)?
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;
    Ok(Json(MemoryStatusResponse {
        memory_status: memory,
    }))
}

/// POST /api/voice/synthesize - text in, mp3 bytes out.
pub async fn synthesize(
    State(state): State<AppState>,
    Json(request): Json<SynthesizeRequest>,
) -> Result<Response, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("No text provided".to_string()));
    }

    let language = request
        .language
        .as_deref()
        .unwrap_or(&state.config.voice.default_language);

    let audio = state
        .speech
        .synthesize(&request.text, language)
        .await
        .map_err(|e| {
            error!(error = %e, "speech synthesis failed");
            ApiError::Internal("Failed to generate speech".to_string())
        })?;

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response())
}

/// POST /api/voice/transcribe - multipart audio in, transcription out.
pub async fn transcribe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<TranscriptionResponse>, ApiError> {
    let mut audio: Option<(Vec<u8>, String)> = None;
    let mut language: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("audio") => {
                let filename = field.file_name().unwrap_or("audio.wav").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read audio: {e}")))?;
                audio = Some((bytes.to_vec(), filename));
            }
            Some("language") => {
                language = field.text().await.ok().filter(|s| !s.is_empty());
            }
            _ => {}
        }
    }

    let Some((bytes, filename)) = audio else {
        return Err(ApiError::BadRequest("No audio file provided".to_string()));
    };
    let language =
        language.unwrap_or_else(|| state.config.voice.default_language.clone());

    let transcription = state
        .speech
        .transcribe(bytes, &filename, &language)
        .await
        .map_err(|e| {
            error!(error = %e, "transcription failed");
            ApiError::Internal("Failed to transcribe audio".to_string())
        })?;

    Ok(Json(TranscriptionResponse { transcription }))
}
