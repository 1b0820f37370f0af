//! Control-API end-to-end scenarios, driven against the real `axum::Router`
//! via `tower::ServiceExt::oneshot` rather than unit calls into individual
//! handlers.

mod support;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use support::{TEST_API_KEY, build_server, test_config};

fn authed(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder().method(method).uri(uri).header("X-API-Key", TEST_API_KEY)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn topic_lifecycle_via_control_api() {
    let router = build_server(test_config()).router();

    let create = router
        .clone()
        .oneshot(
            authed("POST", "/topics")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json!({ "name": "orders" })).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(create.status(), StatusCode::CREATED);

    let list = router.clone().oneshot(authed("GET", "/topics").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(list.status(), StatusCode::OK);
    let body = body_json(list).await;
    let topics = body["topics"].as_array().unwrap();
    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0]["name"], "orders");
    assert_eq!(topics[0]["ring_buffer_size"], 4);

    let stats = router.clone().oneshot(authed("GET", "/stats").body(Body::empty()).unwrap()).await.unwrap();
    let body = body_json(stats).await;
    assert_eq!(body["orders"]["messages"], 0);

    let delete = router.clone().oneshot(authed("DELETE", "/topics/orders").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(delete.status(), StatusCode::OK);

    let missing = router.clone().oneshot(authed("DELETE", "/topics/orders").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let list_after = router.oneshot(authed("GET", "/topics").body(Body::empty()).unwrap()).await.unwrap();
    let body = body_json(list_after).await;
    assert!(body["topics"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn creating_a_duplicate_topic_is_a_conflict() {
    let router = build_server(test_config()).router();
    let make = || {
        authed("POST", "/topics")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json!({ "name": "dup" })).unwrap()))
            .unwrap()
    };

    let first = router.clone().oneshot(make()).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = router.oneshot(make()).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn oversized_ring_size_is_rejected() {
    let router = build_server(test_config()).router();
    let request = authed("POST", "/topics")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&json!({ "name": "t", "ring_size": 1_000_000 })).unwrap()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn api_key_also_accepted_as_query_param() {
    let router = build_server(test_config()).router();
    let request = Request::builder()
        .uri(format!("/health?api_key={TEST_API_KEY}"))
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn wrong_api_key_is_unauthorized() {
    let router = build_server(test_config()).router();
    let request = Request::builder().uri("/topics").header("X-API-Key", "not-the-key").body(Body::empty()).unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn creating_a_topic_after_shutdown_is_serviceunavailable() {
    let router = build_server(test_config()).router();

    let shutdown = router
        .clone()
        .oneshot(authed("POST", "/shutdown").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(shutdown.status(), StatusCode::OK);

    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(3);
    loop {
        let health = router.clone().oneshot(authed("GET", "/health").body(Body::empty()).unwrap()).await.unwrap();
        if body_json(health).await["shutdown_initiated"] == true {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "shutdown never registered");
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let create = router
        .oneshot(
            authed("POST", "/topics")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json!({ "name": "too-late" })).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(create.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn shutdown_endpoint_drains_and_flips_health() {
    let router = build_server(test_config()).router();

    let response = router
        .clone()
        .oneshot(authed("POST", "/shutdown").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The drain runs in the background; poll health until it reports
    // shutdown_initiated rather than asserting on a fixed sleep.
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(3);
    loop {
        let health = router.clone().oneshot(authed("GET", "/health").body(Body::empty()).unwrap()).await.unwrap();
        let body = body_json(health).await;
        if body["shutdown_initiated"] == true {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "shutdown never registered");
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}
