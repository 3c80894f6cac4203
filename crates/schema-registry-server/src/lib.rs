//! HTTP surface for the schema registry engine (component C9, ambient
//! C10). Wires `schema_registry_storage::MemoryEngine` behind axum,
//! exposed as a library so integration tests can exercise the router
//! directly with `tower::ServiceExt::oneshot` instead of binding a socket.

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod state;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use crate::error::{ErrorBody, CONTENT_TYPE};
use crate::state::AppState;

/// Rewrites axum's default 405 body into the registry's `{error_code,
/// message}` shape, per §6.
async fn rewrite_method_not_allowed(req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    if response.status() == StatusCode::METHOD_NOT_ALLOWED {
        let body = Json(ErrorBody {
            error_code: 405,
            message: "Method Not Allowed".to_string(),
        });
        return (StatusCode::METHOD_NOT_ALLOWED, [("content-type", CONTENT_TYPE)], body).into_response();
    }
    response
}

/// Counts error responses by HTTP status for `/metrics`, per §10.4.
async fn record_error_metrics(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    if response.status().is_client_error() || response.status().is_server_error() {
        state.metrics.record_error(response.status().as_u16() as i32);
    }
    response
}

async fn not_found() -> impl IntoResponse {
    let body = Json(ErrorBody {
        error_code: 404,
        message: "Resource not found".to_string(),
    });
    (StatusCode::NOT_FOUND, [("content-type", CONTENT_TYPE)], body)
}

/// Builds the full URL surface (§6) wired against `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/schemas/types", get(handlers::schema_types))
        .route("/schemas/ids/:id", get(handlers::get_schema_by_id))
        .route("/schemas/ids/:id/schema", get(handlers::get_schema_by_id_raw))
        .route("/schemas/ids/:id/subjects", get(handlers::subjects_for_id))
        .route("/schemas/ids/:id/versions", get(handlers::versions_for_id))
        .route("/subjects", get(handlers::list_subjects))
        .route(
            "/subjects/:subject",
            post(handlers::lookup).delete(handlers::delete_subject),
        )
        .route(
            "/subjects/:subject/versions",
            get(handlers::list_versions).post(handlers::register),
        )
        .route(
            "/subjects/:subject/versions/:version",
            get(handlers::get_version).delete(handlers::delete_version),
        )
        .route(
            "/subjects/:subject/versions/:version/schema",
            get(handlers::get_version_schema),
        )
        .route(
            "/subjects/:subject/versions/:version/referencedby",
            get(handlers::referenced_by),
        )
        .route(
            "/compatibility/subjects/:subject/versions/:version",
            post(handlers::check_compatibility_version),
        )
        .route(
            "/compatibility/subjects/:subject/versions",
            post(handlers::check_compatibility_all),
        )
        .route("/config", get(handlers::get_global_config).put(handlers::put_global_config))
        .route(
            "/config/:subject",
            get(handlers::get_subject_config)
                .put(handlers::put_subject_config)
                .delete(handlers::delete_subject_config),
        )
        .route("/mode", get(handlers::get_global_mode).put(handlers::put_global_mode))
        .route(
            "/mode/:subject",
            get(handlers::get_subject_mode)
                .put(handlers::put_subject_mode)
                .delete(handlers::delete_subject_mode),
        )
        .route("/contexts", get(handlers::list_contexts))
        .route("/import/schemas", post(handlers::import_bulk))
        .route("/healthz", get(handlers::healthz))
        .route("/metrics", get(handlers::metrics))
        .fallback(not_found)
        .layer(middleware::from_fn(rewrite_method_not_allowed))
        .layer(middleware::from_fn_with_state(state.clone(), record_error_metrics))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
