//! `POST /shutdown`.

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::json;

use crate::api::AppState;

/// Returns immediately once the drain has been *started*; the drain itself
/// (and the force-close at its deadline) runs in the background so the
/// HTTP response doesn't block on `shutdown_timeout_sec`.
pub async fn shutdown(State(state): State<AppState>) -> impl IntoResponse {
    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        shutdown.shutdown().await;
    });
    Json(json!({ "message": "Graceful shutdown initiated" }))
}
