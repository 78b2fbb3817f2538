//! HTTP API endpoints and router assembly.
//!
//! Public endpoints describe the pack and the standings; the state
//! export/import endpoints are for the host and sit behind Basic auth.

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::auth::{self, AuthConfig};
use crate::protocol::{PackInfo, ServerMessage};
use crate::state::export::HuntStateExport;
use crate::state::AppState;
use crate::types::ScoreEntry;
use crate::ws;

/// Describe the loaded pack (no answers, no block texts).
///
/// GET /api/pack
pub async fn pack_info(State(state): State<Arc<AppState>>) -> Json<PackInfo> {
    Json(PackInfo::from(state.catalog.as_ref()))
}

/// Current standings.
///
/// GET /api/leaderboard
pub async fn leaderboard(State(state): State<Arc<AppState>>) -> Json<Vec<ScoreEntry>> {
    Json(state.leaderboard().await)
}

/// Export every team session as JSON.
///
/// GET /api/state/export
pub async fn export_state(State(state): State<Arc<AppState>>) -> Json<HuntStateExport> {
    Json(state.export_state().await)
}

/// Import a session snapshot.
///
/// POST /api/state/import
///
/// Replaces all current sessions with the imported data and tells connected
/// clients to refresh.
pub async fn import_state(
    State(state): State<Arc<AppState>>,
    Json(export): Json<HuntStateExport>,
) -> Response {
    match state.import_state(export).await {
        Ok(()) => {
            state.broadcast_to_all(ServerMessage::HuntReset);
            ws::host::broadcast_teams_to_host(&state).await;
            (StatusCode::OK, "State imported successfully").into_response()
        }
        Err(e) => {
            tracing::error!("State import failed: {}", e);
            (StatusCode::BAD_REQUEST, format!("Import failed: {}", e)).into_response()
        }
    }
}

/// Assemble the HTTP router
pub fn build_router(state: Arc<AppState>, auth_config: Arc<AuthConfig>, static_dir: &Path) -> Router {
    // Protected host routes (with HTTP Basic Auth)
    let host_routes = Router::new()
        .route("/api/state/export", get(export_state))
        .route("/api/state/import", post(import_state))
        .layer(middleware::from_fn_with_state(
            auth_config.clone(),
            auth::host_auth_middleware,
        ));

    // Host WebSocket connections need the same credentials
    let ws_routes = Router::new()
        .route("/ws", get(ws::ws_handler))
        .layer(middleware::from_fn_with_state(
            auth_config,
            auth::host_ws_auth_middleware,
        ));

    Router::new()
        .route("/api/pack", get(pack_info))
        .route("/api/leaderboard", get(leaderboard))
        .merge(host_routes)
        .merge(ws_routes)
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
