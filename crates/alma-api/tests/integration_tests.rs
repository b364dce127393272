//! Integration tests for the Alma API.
//!
//! Covers every endpoint: the chat turn, conversation management, memory
//! controls, voice synthesis/transcription, and health. Each test builds an
//! independent in-memory state with scripted providers.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use alma_api::handlers::{
    AckResponse, ConversationResponse, ConversationsResponse, HealthResponse,
    MemoryStatusResponse, TranscriptionResponse,
};
use alma_api::{create_router, AppState};
use alma_chat::{ChatService, SessionManager, TurnReply};
use alma_core::{AlmaConfig, ConversationMode};
use alma_llm::{LlmError, ScriptedModel, ScriptedSpeech};
use alma_store::Database;

// =============================================================================
// Helpers
// =============================================================================

/// Create a fresh AppState with an in-memory DB and scripted providers.
fn make_state(model: Arc<ScriptedModel>, speech: Arc<ScriptedSpeech>) -> AppState {
    let config = AlmaConfig::default();
    let db = Arc::new(Database::in_memory().unwrap());
    let sessions = Arc::new(SessionManager::new(db));
    let chat = ChatService::new(Arc::clone(&sessions), model, &config);
    AppState::new(config, sessions, chat, speech)
}

/// State with no scripted replies, for endpoints that never hit a provider.
fn make_app() -> axum::Router {
    let model = Arc::new(ScriptedModel::new());
    let speech = Arc::new(ScriptedSpeech::new(b"ID3mp3".to_vec(), "hello world"));
    create_router(make_state(model, speech))
}

/// Seed a session directly through the session manager.
fn seed_session(state: &AppState, user_id: &str) -> Uuid {
    state
        .sessions
        .create_session(user_id, Some("Seeded".to_string()))
        .unwrap()
        .id
}

fn get_req(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn put_json(uri: &str, json: &str) -> Request<Body> {
    Request::put(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn delete_json(uri: &str, json: &str) -> Request<Body> {
    Request::delete(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

/// Build a multipart/form-data request body by hand.
///
/// Each part is (field name, optional filename, data).
fn multipart_request(uri: &str, parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
    let boundary = "test-boundary-7MA4YWxkTrZu0gW";
    let mut body = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        match filename {
            Some(f) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    name, f
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    Request::post(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Read full response body bytes.
async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 32 * 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

// =============================================================================
// GET /api/health
// =============================================================================

#[tokio::test]
async fn test_health_happy_path() {
    let app = make_app();
    let resp = app.oneshot(get_req("/api/health")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let health: HealthResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health.status, "healthy");
    assert!(!health.version.is_empty());
}

// =============================================================================
// POST /api/chat
// =============================================================================

#[tokio::test]
async fn test_chat_first_turn_creates_session_with_title() {
    let model = Arc::new(ScriptedModel::with_replies([
        "It sounds like a difficult conversation is ahead.",
        r#"["How should I open the meeting?", "What documentation do I need?", "Should HR be present?"]"#,
        "Team Conflict Advice",
    ]));
    let speech = Arc::new(ScriptedSpeech::default());
    let state = make_state(Arc::clone(&model), speech);

    let app = create_router(state.clone());
    let resp = app
        .oneshot(post_json(
            "/api/chat",
            r#"{"message":"I need to let someone go next week","userId":"user-1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let reply: TurnReply = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        reply.message.content,
        "It sounds like a difficult conversation is ahead."
    );
    assert_eq!(reply.mode, ConversationMode::Ask);
    assert_eq!(reply.suggestions.len(), 3);
    assert!(reply.memory_status.is_active);

    // Wire format is camelCase.
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(json.get("sessionId").is_some());
    assert!(json.get("memoryStatus").is_some());

    // The session was persisted with the generated title and both messages.
    let app = create_router(state);
    let resp = app
        .oneshot(get_req(&format!(
            "/api/conversations?sessionId={}",
            reply.session_id
        )))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let conv: ConversationResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(conv.conversation.title.as_deref(), Some("Team Conflict Advice"));
    assert_eq!(conv.conversation.messages.len(), 2);
    assert_eq!(model.requests().len(), 3);
}

#[tokio::test]
async fn test_chat_second_turn_reuses_session() {
    let model = Arc::new(ScriptedModel::with_replies([
        "First reply.",
        r#"["a"]"#,
        "Title",
        "Second reply.",
        r#"["b"]"#,
    ]));
    let speech = Arc::new(ScriptedSpeech::default());
    let state = make_state(Arc::clone(&model), speech);

    let app = create_router(state.clone());
    let resp = app
        .oneshot(post_json(
            "/api/chat",
            r#"{"message":"hello","userId":"user-1"}"#,
        ))
        .await
        .unwrap();
    let bytes = body_bytes(resp).await;
    let first: TurnReply = serde_json::from_slice(&bytes).unwrap();

    let app = create_router(state.clone());
    let resp = app
        .oneshot(post_json(
            "/api/chat",
            &format!(
                r#"{{"message":"more detail please","userId":"user-1","sessionId":"{}"}}"#,
                first.session_id
            ),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let second: TurnReply = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(second.session_id, first.session_id);
    assert_eq!(second.message.content, "Second reply.");

    // No re-titling on the second turn: 3 calls for the first, 2 for the second.
    assert_eq!(model.requests().len(), 5);

    let session = state.sessions.get_session(first.session_id).unwrap().unwrap();
    assert_eq!(session.messages.len(), 4);
}

#[tokio::test]
async fn test_chat_mode_switch_persists() {
    let model = Arc::new(ScriptedModel::with_replies([
        "Reflective reply.",
        r#"["x"]"#,
        "Title",
    ]));
    let speech = Arc::new(ScriptedSpeech::default());
    let state = make_state(model, speech);

    let app = create_router(state.clone());
    let resp = app
        .oneshot(post_json(
            "/api/chat",
            r#"{"message":"I keep second-guessing myself","userId":"u1","mode":"reflect"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let reply: TurnReply = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(reply.mode, ConversationMode::Reflect);

    let session = state.sessions.get_session(reply.session_id).unwrap().unwrap();
    assert_eq!(session.mode, ConversationMode::Reflect);
}

#[tokio::test]
async fn test_chat_quiet_mode_gate_silence() {
    let model = Arc::new(ScriptedModel::with_replies([
        r#"{"shouldRespond": false, "reasoning": "User is journaling"}"#,
        "Quiet Notes",
    ]));
    let speech = Arc::new(ScriptedSpeech::default());
    let state = make_state(Arc::clone(&model), speech);

    let app = create_router(state.clone());
    let resp = app
        .oneshot(post_json(
            "/api/chat",
            r#"{"message":"Just noting this down for later","userId":"u1","mode":"quiet"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let reply: TurnReply = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(reply.message.content, "");
    assert!(reply.suggestions.is_empty());
    assert_eq!(model.requests().len(), 2);

    // The silent assistant turn is stored but kept out of memory context.
    let session = state.sessions.get_session(reply.session_id).unwrap().unwrap();
    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.memory.context.len(), 1);
}

#[tokio::test]
async fn test_chat_quiet_mode_gate_allows_response() {
    let model = Arc::new(ScriptedModel::with_replies([
        r#"{"shouldRespond": true, "reasoning": "Direct request for input"}"#,
        "Here is what I would do first.",
        r#"["What if that fails?"]"#,
        "Urgent Decision",
    ]));
    let speech = Arc::new(ScriptedSpeech::default());
    let state = make_state(Arc::clone(&model), speech);

    let app = create_router(state);
    let resp = app
        .oneshot(post_json(
            "/api/chat",
            r#"{"message":"what should I do right now?","userId":"u1","mode":"quiet"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let reply: TurnReply = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(reply.message.content, "Here is what I would do first.");
    assert_eq!(reply.suggestions, vec!["What if that fails?"]);
    assert_eq!(model.requests().len(), 4);
}

#[tokio::test]
async fn test_chat_missing_message_returns_400() {
    let app = make_app();
    let resp = app
        .oneshot(post_json("/api/chat", r#"{"userId":"u1"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = body_bytes(resp).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["error"], "bad_request");
    assert_eq!(json["message"], "message cannot be empty");
}

#[tokio::test]
async fn test_chat_missing_user_id_returns_400() {
    let app = make_app();
    let resp = app
        .oneshot(post_json("/api/chat", r#"{"message":"hello"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = body_bytes(resp).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["message"], "userId is required");
}

#[tokio::test]
async fn test_chat_message_too_long_returns_400() {
    let app = make_app();
    let long = "a".repeat(2001);
    let resp = app
        .oneshot(post_json(
            "/api/chat",
            &format!(r#"{{"message":"{}","userId":"u1"}}"#, long),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = body_bytes(resp).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        json["message"],
        "message exceeds maximum length of 2000 characters"
    );
}

#[tokio::test]
async fn test_chat_provider_failure_returns_friendly_500() {
    let model = Arc::new(ScriptedModel::new());
    model.push_error(LlmError::Unavailable("connection refused".to_string()));
    let speech = Arc::new(ScriptedSpeech::default());
    let state = make_state(model, speech);

    let app = create_router(state.clone());
    let resp = app
        .oneshot(post_json(
            "/api/chat",
            r#"{"message":"hello","userId":"u1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = body_bytes(resp).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["error"], "internal_error");
    assert_eq!(json["message"], "Something went wrong, want to try again?");
    // Provider detail never leaks to the client.
    assert!(!String::from_utf8_lossy(&bytes).contains("connection refused"));
}

// =============================================================================
// GET /api/conversations
// =============================================================================

#[tokio::test]
async fn test_get_conversation_by_session_id() {
    let model = Arc::new(ScriptedModel::new());
    let speech = Arc::new(ScriptedSpeech::default());
    let state = make_state(model, speech);
    let id = seed_session(&state, "alice");

    let app = create_router(state);
    let resp = app
        .oneshot(get_req(&format!("/api/conversations?sessionId={}", id)))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let conv: ConversationResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(conv.conversation.id, id);
    assert_eq!(conv.conversation.user_id, "alice");
}

#[tokio::test]
async fn test_get_conversation_unknown_id_returns_404() {
    let app = make_app();
    let resp = app
        .oneshot(get_req(&format!(
            "/api/conversations?sessionId={}",
            Uuid::new_v4()
        )))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let bytes = body_bytes(resp).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["error"], "not_found");
    assert_eq!(json["message"], "Conversation not found");
}

#[tokio::test]
async fn test_get_conversations_by_user() {
    let model = Arc::new(ScriptedModel::new());
    let speech = Arc::new(ScriptedSpeech::default());
    let state = make_state(model, speech);
    seed_session(&state, "alice");
    seed_session(&state, "alice");
    seed_session(&state, "bob");

    let app = create_router(state);
    let resp = app
        .oneshot(get_req("/api/conversations?userId=alice"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let convs: ConversationsResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(convs.conversations.len(), 2);
    assert!(convs.conversations.iter().all(|c| c.user_id == "alice"));
}

#[tokio::test]
async fn test_get_conversations_unknown_user_returns_empty() {
    let app = make_app();
    let resp = app
        .oneshot(get_req("/api/conversations?userId=nobody"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let convs: ConversationsResponse = serde_json::from_slice(&bytes).unwrap();
    assert!(convs.conversations.is_empty());
}

#[tokio::test]
async fn test_get_conversations_missing_params_returns_400() {
    let app = make_app();
    let resp = app.oneshot(get_req("/api/conversations")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = body_bytes(resp).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["message"], "userId or sessionId is required");
}

// =============================================================================
// PUT /api/conversations
// =============================================================================

#[tokio::test]
async fn test_update_conversation_title() {
    let model = Arc::new(ScriptedModel::new());
    let speech = Arc::new(ScriptedSpeech::default());
    let state = make_state(model, speech);
    let id = seed_session(&state, "alice");

    let app = create_router(state.clone());
    let resp = app
        .oneshot(put_json(
            "/api/conversations",
            &format!(r#"{{"sessionId":"{}","title":"Q3 Planning"}}"#, id),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let ack: AckResponse = serde_json::from_slice(&bytes).unwrap();
    assert!(ack.success);

    let app = create_router(state);
    let resp = app
        .oneshot(get_req(&format!("/api/conversations?sessionId={}", id)))
        .await
        .unwrap();
    let bytes = body_bytes(resp).await;
    let conv: ConversationResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(conv.conversation.title.as_deref(), Some("Q3 Planning"));
}

#[tokio::test]
async fn test_update_conversation_empty_title_allowed() {
    let model = Arc::new(ScriptedModel::new());
    let speech = Arc::new(ScriptedSpeech::default());
    let state = make_state(model, speech);
    let id = seed_session(&state, "alice");

    let app = create_router(state.clone());
    let resp = app
        .oneshot(put_json(
            "/api/conversations",
            &format!(r#"{{"sessionId":"{}","title":""}}"#, id),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let session = state.sessions.get_session(id).unwrap().unwrap();
    assert_eq!(session.title.as_deref(), Some(""));
}

#[tokio::test]
async fn test_update_conversation_missing_session_id_returns_400() {
    let app = make_app();
    let resp = app
        .oneshot(put_json("/api/conversations", r#"{"title":"Renamed"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = body_bytes(resp).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["message"], "sessionId is required");
}

#[tokio::test]
async fn test_update_conversation_missing_title_returns_400() {
    let model = Arc::new(ScriptedModel::new());
    let speech = Arc::new(ScriptedSpeech::default());
    let state = make_state(model, speech);
    let id = seed_session(&state, "alice");

    let app = create_router(state);
    let resp = app
        .oneshot(put_json(
            "/api/conversations",
            &format!(r#"{{"sessionId":"{}"}}"#, id),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = body_bytes(resp).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["message"], "title is required");
}

#[tokio::test]
async fn test_update_conversation_unknown_returns_404() {
    let app = make_app();
    let resp = app
        .oneshot(put_json(
            "/api/conversations",
            &format!(r#"{{"sessionId":"{}","title":"x"}}"#, Uuid::new_v4()),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// DELETE /api/conversations
// =============================================================================

#[tokio::test]
async fn test_delete_conversation() {
    let model = Arc::new(ScriptedModel::new());
    let speech = Arc::new(ScriptedSpeech::default());
    let state = make_state(model, speech);
    let id = seed_session(&state, "alice");

    let app = create_router(state.clone());
    let resp = app
        .oneshot(delete_json(
            "/api/conversations",
            &format!(r#"{{"sessionId":"{}"}}"#, id),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let ack: AckResponse = serde_json::from_slice(&bytes).unwrap();
    assert!(ack.success);

    // Deleting again reports not found.
    let app = create_router(state);
    let resp = app
        .oneshot(delete_json(
            "/api/conversations",
            &format!(r#"{{"sessionId":"{}"}}"#, id),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_conversation_missing_session_id_returns_400() {
    let app = make_app();
    let resp = app
        .oneshot(delete_json("/api/conversations", r#"{}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = body_bytes(resp).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["message"], "sessionId is required");
}

// =============================================================================
// POST /api/memory
// =============================================================================

#[tokio::test]
async fn test_memory_toggle_flips_active_flag() {
    let model = Arc::new(ScriptedModel::new());
    let speech = Arc::new(ScriptedSpeech::default());
    let state = make_state(model, speech);
    let id = seed_session(&state, "alice");

    let app = create_router(state.clone());
    let resp = app
        .oneshot(post_json(
            "/api/memory",
            &format!(r#"{{"sessionId":"{}","action":"toggle"}}"#, id),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let status: MemoryStatusResponse = serde_json::from_slice(&bytes).unwrap();
    assert!(!status.memory_status.is_active);

    let app = create_router(state);
    let resp = app
        .oneshot(post_json(
            "/api/memory",
            &format!(r#"{{"sessionId":"{}","action":"toggle"}}"#, id),
        ))
        .await
        .unwrap();
    let bytes = body_bytes(resp).await;
    let status: MemoryStatusResponse = serde_json::from_slice(&bytes).unwrap();
    assert!(status.memory_status.is_active);
}

#[tokio::test]
async fn test_memory_toggle_private() {
    let model = Arc::new(ScriptedModel::new());
    let speech = Arc::new(ScriptedSpeech::default());
    let state = make_state(model, speech);
    let id = seed_session(&state, "alice");

    let app = create_router(state);
    let resp = app
        .oneshot(post_json(
            "/api/memory",
            &format!(r#"{{"sessionId":"{}","action":"togglePrivate"}}"#, id),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let status: MemoryStatusResponse = serde_json::from_slice(&bytes).unwrap();
    assert!(status.memory_status.is_private);
}

#[tokio::test]
async fn test_memory_clear_empties_context() {
    let model = Arc::new(ScriptedModel::new());
    let speech = Arc::new(ScriptedSpeech::default());
    let state = make_state(model, speech);
    let id = seed_session(&state, "alice");

    let message = alma_core::Message::new(
        alma_core::Role::User,
        "remember this".to_string(),
        ConversationMode::Ask,
    );
    state.sessions.add_message(id, message).unwrap();

    let app = create_router(state.clone());
    let resp = app
        .oneshot(post_json(
            "/api/memory",
            &format!(r#"{{"sessionId":"{}","action":"clear"}}"#, id),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let status: MemoryStatusResponse = serde_json::from_slice(&bytes).unwrap();
    assert!(status.memory_status.context.is_empty());
    assert!(status.memory_status.last_cleared.is_some());
}

#[tokio::test]
async fn test_memory_invalid_action_returns_400() {
    let model = Arc::new(ScriptedModel::new());
    let speech = Arc::new(ScriptedSpeech::default());
    let state = make_state(model, speech);
    let id = seed_session(&state, "alice");

    let app = create_router(state);
    let resp = app
        .oneshot(post_json(
            "/api/memory",
            &format!(r#"{{"sessionId":"{}","action":"explode"}}"#, id),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = body_bytes(resp).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["message"], "Invalid action");
}

#[tokio::test]
async fn test_memory_missing_params_returns_400() {
    let app = make_app();
    let resp = app
        .oneshot(post_json("/api/memory", r#"{"action":"toggle"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = body_bytes(resp).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["message"], "sessionId and action are required");
}

#[tokio::test]
async fn test_memory_action_unknown_session_returns_404() {
    let app = make_app();
    let resp = app
        .oneshot(post_json(
            "/api/memory",
            &format!(r#"{{"sessionId":"{}","action":"toggle"}}"#, Uuid::new_v4()),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let bytes = body_bytes(resp).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["message"], "Session not found");
}

// =============================================================================
// GET /api/memory
// =============================================================================

#[tokio::test]
async fn test_memory_status_happy_path() {
    let model = Arc::new(ScriptedModel::new());
    let speech = Arc::new(ScriptedSpeech::default());
    let state = make_state(model, speech);
    let id = seed_session(&state, "alice");

    let app = create_router(state);
    let resp = app
        .oneshot(get_req(&format!("/api/memory?sessionId={}", id)))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let status: MemoryStatusResponse = serde_json::from_slice(&bytes).unwrap();
    assert!(status.memory_status.is_active);
    assert!(!status.memory_status.is_private);
    assert!(status.memory_status.context.is_empty());
}

#[tokio::test]
async fn test_memory_status_missing_session_id_returns_400() {
    let app = make_app();
    let resp = app.oneshot(get_req("/api/memory")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = body_bytes(resp).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["message"], "sessionId is required");
}

#[tokio::test]
async fn test_memory_status_unknown_session_returns_404() {
    let app = make_app();
    let resp = app
        .oneshot(get_req(&format!("/api/memory?sessionId={}", Uuid::new_v4())))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// POST /api/voice/synthesize
// =============================================================================

#[tokio::test]
async fn test_synthesize_returns_mpeg_audio() {
    let model = Arc::new(ScriptedModel::new());
    let speech = Arc::new(ScriptedSpeech::new(vec![0x49, 0x44, 0x33, 0x04], "unused"));
    let state = make_state(model, Arc::clone(&speech));

    let app = create_router(state);
    let resp = app
        .oneshot(post_json(
            "/api/voice/synthesize",
            r#"{"text":"Hello there"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "audio/mpeg"
    );
    let bytes = body_bytes(resp).await;
    assert_eq!(bytes, vec![0x49, 0x44, 0x33, 0x04]);
    assert_eq!(speech.spoken(), vec!["Hello there".to_string()]);
}

#[tokio::test]
async fn test_synthesize_empty_text_returns_400() {
    let app = make_app();
    let resp = app
        .oneshot(post_json("/api/voice/synthesize", r#"{"text":"   "}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = body_bytes(resp).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["message"], "No text provided");
}

#[tokio::test]
async fn test_synthesize_missing_text_returns_400() {
    let app = make_app();
    let resp = app
        .oneshot(post_json("/api/voice/synthesize", r#"{}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_synthesize_provider_failure_returns_500() {
    let model = Arc::new(ScriptedModel::new());
    let speech = Arc::new(ScriptedSpeech::failing());
    let state = make_state(model, speech);

    let app = create_router(state);
    let resp = app
        .oneshot(post_json("/api/voice/synthesize", r#"{"text":"Hello"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = body_bytes(resp).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["message"], "Failed to generate speech");
}

// =============================================================================
// POST /api/voice/transcribe
// =============================================================================

#[tokio::test]
async fn test_transcribe_happy_path() {
    let model = Arc::new(ScriptedModel::new());
    let speech = Arc::new(ScriptedSpeech::new(Vec::new(), "I would like some advice"));
    let state = make_state(model, speech);

    let app = create_router(state);
    let resp = app
        .oneshot(multipart_request(
            "/api/voice/transcribe",
            &[("audio", Some("clip.webm"), b"fake-audio-bytes")],
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let out: TranscriptionResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(out.transcription, "I would like some advice");
}

#[tokio::test]
async fn test_transcribe_with_language_field() {
    let model = Arc::new(ScriptedModel::new());
    let speech = Arc::new(ScriptedSpeech::new(Vec::new(), "hola"));
    let state = make_state(model, speech);

    let app = create_router(state);
    let resp = app
        .oneshot(multipart_request(
            "/api/voice/transcribe",
            &[
                ("audio", Some("clip.mp3"), b"fake-audio-bytes"),
                ("language", None, b"es"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let out: TranscriptionResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(out.transcription, "hola");
}

#[tokio::test]
async fn test_transcribe_missing_audio_returns_400() {
    let app = make_app();
    let resp = app
        .oneshot(multipart_request(
            "/api/voice/transcribe",
            &[("language", None, b"en")],
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = body_bytes(resp).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["message"], "No audio file provided");
}

#[tokio::test]
async fn test_transcribe_provider_failure_returns_500() {
    let model = Arc::new(ScriptedModel::new());
    let speech = Arc::new(ScriptedSpeech::failing());
    let state = make_state(model, speech);

    let app = create_router(state);
    let resp = app
        .oneshot(multipart_request(
            "/api/voice/transcribe",
            &[("audio", Some("clip.wav"), b"fake-audio-bytes")],
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = body_bytes(resp).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["message"], "Failed to transcribe audio");
}

// =============================================================================
// 404 for unknown routes
// =============================================================================

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = make_app();
    let resp = app.oneshot(get_req("/api/nonexistent")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
