//! `GET/POST /topics`, `DELETE /topics/{name}`.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;

use crate::api::AppState;
use crate::api::types::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateTopicRequest {
    pub name: String,
    pub ring_size: Option<u64>,
}

pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "topics": state.topics.list_topics() }))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateTopicRequest>,
) -> Result<impl IntoResponse, ApiError> {
    match state.topics.create_topic(&body.name, body.ring_size) {
        Ok(true) => Ok((
            StatusCode::CREATED,
            Json(json!({ "status": "created", "topic": body.name })),
        )),
        Ok(false) => Err(ApiError::conflict(
            "TOPIC_EXISTS",
            format!("topic '{}' already exists", body.name),
        )),
        Err(err) => Err(ApiError::from_broker(err)),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if state.topics.is_shutting_down() {
        return Err(ApiError::service_unavailable("server is shutting down"));
    }
    if state.topics.delete_topic(&name) {
        Ok(Json(json!({ "status": "deleted", "topic": name })))
    } else {
        Err(ApiError::not_found("TOPIC_NOT_FOUND", format!("topic '{name}' not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::ManagerConfig;
    use crate::broker::TopicManager;
    use crate::core::config::AppConfig;
    use crate::core::cli::CliConfig;
    use crate::core::shutdown::ShutdownService;
    use std::time::Duration;

    fn state() -> AppState {
        let config = AppConfig::load(&CliConfig::default()).unwrap();
        let topics = TopicManager::new(ManagerConfig {
            default_ring_size: config.broker.default_ring_size,
            max_ring_size: config.broker.max_ring_size,
            subscriber_queue_size: config.broker.subscriber_queue_size,
            slow_consumer_threshold: config.broker.slow_consumer_threshold,
        });
        let shutdown = ShutdownService::new(topics.clone(), Duration::from_secs(5));
        AppState { topics, shutdown, auth: config.auth }
    }

    #[tokio::test]
    async fn delete_reports_not_found_for_unknown_topic() {
        let state = state();
        let err = delete(State(state), Path("ghost".to_string())).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }

    #[tokio::test]
    async fn create_then_delete_round_trips() {
        let state = state();
        create(
            State(state.clone()),
            Json(CreateTopicRequest { name: "t".to_string(), ring_size: None }),
        )
        .await
        .unwrap();
        assert!(state.topics.get_topic("t").is_some());
        delete(State(state.clone()), Path("t".to_string())).await.unwrap();
        assert!(state.topics.get_topic("t").is_none());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_name() {
        let state = state();
        create(
            State(state.clone()),
            Json(CreateTopicRequest { name: "t".to_string(), ring_size: None }),
        )
        .await
        .unwrap();
        let err = create(
            State(state),
            Json(CreateTopicRequest { name: "t".to_string(), ring_size: None }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Conflict { .. }));
    }
}
