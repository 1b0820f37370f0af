//! `GET /health`, `GET /stats`.

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::{Map, json};

use crate::api::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.topics.health())
}

/// `{name: {messages, subscribers}}`, a per-topic map rather than an array,
/// unlike `GET /topics` which is array-shaped.
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    let mut body = Map::new();
    for stat in state.topics.stats() {
        body.insert(
            stat.name.clone(),
            json!({
                "messages": stat.total_published,
                "subscribers": stat.subscriber_count,
            }),
        );
    }
    Json(serde_json::Value::Object(body))
}
