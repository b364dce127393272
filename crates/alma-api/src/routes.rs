//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression,
//! and all endpoint handlers.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
///
/// # Arguments
/// * `state` - The shared application state.
///
/// # Returns
/// A fully configured axum Router ready to serve requests.
pub fn create_router(state: AppState) -> Router {
    // CORS middleware: allow localhost origins for the web UI.
    // Use the configured port (from CLI/env/config) plus port+1 for dev server.
    let port = state.config.server.port;
    let dev_port = port.saturating_add(1);
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([
            format!("http://127.0.0.1:{}", port)
                .parse::<HeaderValue>()
                .unwrap(),
            format!("http://localhost:{}", port)
                .parse::<HeaderValue>()
                .unwrap(),
            format!("http://127.0.0.1:{}", dev_port)
                .parse::<HeaderValue>()
                .unwrap(),
            format!("http://localhost:{}", dev_port)
                .parse::<HeaderValue>()
                .unwrap(),
        ]))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/chat", post(handlers::chat))
        .route(
            "/api/conversations",
            get(handlers::get_conversations)
                .put(handlers::update_conversation)
                .delete(handlers::delete_conversation),
        )
        .route(
            "/api/memory",
            get(handlers::memory_status).post(handlers::memory_action),
        )
        .route("/api/voice/synthesize", post(handlers::synthesize))
        .route(
            "/api/voice/transcribe",
            post(handlers::transcribe).layer(DefaultBodyLimit::max(20 * 1024 * 1024)), // 20MB for audio uploads
        )
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB global limit
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured address.
pub async fn start_server(state: AppState) -> Result<(), alma_core::AlmaError> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);

    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| alma_core::AlmaError::Api(format!("Failed to bind: {}", e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| alma_core::AlmaError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
