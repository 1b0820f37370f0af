//! `GET /ws`: authenticate, then upgrade to the session's wire protocol.

use axum::extract::{State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};

use crate::api::AppState;
use crate::api::auth::extract_key;
use crate::session;

pub async fn upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    request: axum::extract::Request,
) -> Response {
    let authorized = extract_key(&request).map(|key| state.auth.is_valid(&key)).unwrap_or(false);
    if !authorized {
        return (axum::http::StatusCode::UNAUTHORIZED, "invalid or missing API key").into_response();
    }

    ws.on_upgrade(move |socket| session::run(socket, state.topics))
}
