//! Truvo dashboard backend.
//!
//! HTTP API over the agent registry and call ledger, playground token
//! issuance, the real-time platform webhook receiver, and the static
//! dashboard.

pub mod api;
pub mod api_agents;
pub mod api_calls;
pub mod api_catalog;
pub mod api_livekit;
pub mod api_webhooks;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use truvo_db::DbPool;
use truvo_types::AgentDefaults;
use truvo_voice::VoiceService;

/// Application state shared across all request handlers.
///
/// Nothing here is mutated after startup; all durable state is in the
/// database.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Token issuing and webhook verification.
    pub voice_service: Arc<VoiceService>,
    /// Agent creation defaults and the worker fallback configuration.
    pub defaults: Arc<AgentDefaults>,
    /// Static dashboard root. Not served when `None` or missing on disk.
    pub dashboard_dir: Option<PathBuf>,
}

/// Maximum request body size (1 MiB).
const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn api_routes() -> Router {
    Router::new()
        .route(
            "/agents",
            get(api_agents::list_agents_handler).post(api_agents::create_agent_handler),
        )
        .route(
            "/agents/{id}",
            get(api_agents::get_agent_handler)
                .put(api_agents::replace_agent_handler)
                .delete(api_agents::delete_agent_handler),
        )
        .route(
            "/agents/{id}/config",
            get(api_agents::get_agent_config_handler),
        )
        .route(
            "/calls",
            get(api_calls::list_calls_handler).post(api_calls::create_call_handler),
        )
        .route("/livekit/token", post(api_livekit::create_token_handler))
        .route(
            "/webhooks/livekit",
            post(api_webhooks::livekit_webhook_handler),
        )
        .route("/tools", get(api_catalog::list_tools_handler))
        .route("/voices", get(api_catalog::list_voices_handler))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes());

    let router = match state.dashboard_dir.as_ref() {
        Some(dir) if dir.join("index.html").exists() => {
            tracing::info!(path = %dir.display(), "serving dashboard");
            router.fallback_service(
                ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))),
            )
        }
        Some(dir) => {
            tracing::info!(path = %dir.display(), "dashboard directory not found, skipping static file serving");
            router
        }
        None => router,
    };

    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
