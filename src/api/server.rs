//! Control API + WebSocket transport wiring.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use tokio::net::TcpListener;

use crate::broker::TopicManager;
use crate::core::config::{AppConfig, AuthConfig};
use crate::core::shutdown::ShutdownService;

use super::auth::require_api_key;
use super::middleware;
use super::routes::{health, shutdown as shutdown_route, topics, ws};

/// Shared state for every control-API handler and the `/ws` upgrade.
#[derive(Clone)]
pub struct AppState {
    pub topics: Arc<TopicManager>,
    pub shutdown: ShutdownService,
    pub auth: AuthConfig,
}

pub struct ApiServer {
    config: AppConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: AppConfig, topics: Arc<TopicManager>, shutdown: ShutdownService) -> Self {
        let state = AppState {
            topics,
            shutdown,
            auth: config.auth.clone(),
        };
        Self { config, state }
    }

    pub fn router(&self) -> Router {
        let control = Router::new()
            .route("/topics", get(topics::list).post(topics::create))
            .route("/topics/{name}", delete(topics::delete))
            .route("/health", get(health::health))
            .route("/stats", get(health::stats))
            .route("/shutdown", post(shutdown_route::shutdown))
            .route_layer(axum::middleware::from_fn_with_state(
                self.state.clone(),
                require_api_key,
            ));

        Router::new()
            .route("/", get(root))
            .route("/ws", get(ws::upgrade))
            .merge(control)
            .fallback(middleware::handle_404)
            .layer(middleware::cors())
            .with_state(self.state.clone())
    }

    pub async fn start(self) -> Result<()> {
        let addr = SocketAddr::new(self.config.server.host.parse()?, self.config.server.port);
        let shutdown = self.state.shutdown.clone();
        let router = self.router();

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "control API listening");
        axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown.wait())
            .await?;
        Ok(())
    }
}

async fn root() -> impl IntoResponse {
    "broker-rs is running\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::ManagerConfig;
    use crate::core::cli::CliConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn server() -> ApiServer {
        let config = AppConfig::load(&CliConfig {
            api_keys: Some(vec!["test-key".to_string()]),
            ..Default::default()
        })
        .unwrap();
        let topics = TopicManager::new(ManagerConfig {
            default_ring_size: config.broker.default_ring_size,
            max_ring_size: config.broker.max_ring_size,
            subscriber_queue_size: config.broker.subscriber_queue_size,
            slow_consumer_threshold: config.broker.slow_consumer_threshold,
        });
        let shutdown = ShutdownService::new(topics.clone(), std::time::Duration::from_secs(5));
        ApiServer::new(config, topics, shutdown)
    }

    #[tokio::test]
    async fn unauthenticated_control_request_is_rejected() {
        let router = server().router();
        let response = router
            .oneshot(Request::builder().uri("/topics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn root_liveness_route_needs_no_auth() {
        let router = server().router();
        let response = router
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn authenticated_health_check_succeeds() {
        let router = server().router();
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("X-API-Key", "test-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
