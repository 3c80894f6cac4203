//! End-to-end HTTP surface tests (§10.5), exercising the router the same
//! way a client would rather than calling handlers or the Engine directly.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use schema_registry_core::{CompatibilityMode, EngineBackend, Mode};
use schema_registry_server::{build_router, metrics::RegistryMetrics, state::AppState};
use schema_registry_storage::MemoryEngine;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_state() -> AppState {
    let engine: Arc<dyn EngineBackend> =
        Arc::new(MemoryEngine::new(CompatibilityMode::Backward, Mode::ReadWrite));
    AppState {
        engine,
        metrics: Arc::new(RegistryMetrics::new()),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn register_then_lookup_round_trips() {
    let router = build_router(test_state());

    let register_req = json_request(
        "POST",
        "/subjects/orders-value/versions",
        json!({"schema": "{\"type\":\"record\",\"name\":\"Order\",\"fields\":[{\"name\":\"id\",\"type\":\"string\"}]}"}),
    );
    let response = router.clone().oneshot(register_req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], 1);

    let lookup_req = json_request(
        "POST",
        "/subjects/orders-value",
        json!({"schema": "{\"type\":\"record\",\"name\":\"Order\",\"fields\":[{\"name\":\"id\",\"type\":\"string\"}]}"}),
    );
    let response = router.oneshot(lookup_req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], 1);
    assert_eq!(body["version"], 1);
    assert!(body.get("schemaType").is_none());
}

#[tokio::test]
async fn identical_schema_different_subjects_shares_id() {
    let router = build_router(test_state());
    let schema = "{\"type\":\"record\",\"name\":\"Sensor\",\"fields\":[{\"name\":\"id\",\"type\":\"string\"}]}";

    for subject in ["a", "b"] {
        let req = json_request(
            "POST",
            &format!("/subjects/{subject}/versions"),
            json!({"schema": schema}),
        );
        let response = router.clone().oneshot(req).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["id"], 1);
    }

    let req = Request::builder()
        .uri("/schemas/ids/1/subjects")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(req).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body, json!(["a", "b"]));
}

#[tokio::test]
async fn incompatible_backward_change_is_rejected() {
    let router = build_router(test_state());

    let v1 = json_request(
        "POST",
        "/subjects/u/versions",
        json!({"schema": "{\"type\":\"record\",\"name\":\"U\",\"fields\":[{\"name\":\"id\",\"type\":\"long\"},{\"name\":\"name\",\"type\":\"string\"}]}"}),
    );
    let response = router.clone().oneshot(v1).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let v2 = json_request(
        "POST",
        "/subjects/u/versions",
        json!({"schema": "{\"type\":\"record\",\"name\":\"U\",\"fields\":[{\"name\":\"id\",\"type\":\"long\"}]}"}),
    );
    let response = router.oneshot(v2).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], 409);
}

#[tokio::test]
async fn read_only_mode_rejects_register() {
    let router = build_router(test_state());

    let set_mode = json_request("PUT", "/mode", json!({"mode": "READONLY"}));
    let response = router.clone().oneshot(set_mode).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let register_req = json_request(
        "POST",
        "/subjects/x/versions",
        json!({"schema": "{\"type\":\"record\",\"name\":\"X\",\"fields\":[]}"}),
    );
    let response = router.oneshot(register_req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], 42205);
}

#[tokio::test]
async fn contexts_are_sorted_with_default_first() {
    let router = build_router(test_state());

    for (subject_path, schema_name) in [
        (":.ctxA:sub", "A"),
        (":.ctxB:sub", "B"),
    ] {
        let req = json_request(
            "POST",
            &format!("/subjects/{subject_path}/versions"),
            json!({"schema": format!("{{\"type\":\"record\",\"name\":\"{schema_name}\",\"fields\":[]}}")}),
        );
        let response = router.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let req = Request::builder().uri("/contexts").body(Body::empty()).unwrap();
    let response = router.oneshot(req).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body, json!([".", ".ctxA", ".ctxB"]));
}

#[tokio::test]
async fn unsupported_method_returns_405_with_registry_body() {
    let router = build_router(test_state());

    let req = Request::builder()
        .method("PATCH")
        .uri("/subjects")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], 405);
}

#[tokio::test]
async fn healthz_is_always_ok() {
    let router = build_router(test_state());
    let req = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let response = router.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
