//! Maps `schema_registry_core::Error` to the HTTP layer (§7). The status
//! code and `error_code` always come from the error itself, never from a
//! re-derived string match.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use schema_registry_core::Error as CoreError;
use serde::Serialize;

/// Content type carried by every response, including errors, per §6.
pub const CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error_code: i32,
    pub message: String,
}

#[derive(Debug)]
pub enum AppError {
    Core(CoreError),
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        AppError::Core(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError::Core(err) = self;
        let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(ErrorBody {
            error_code: err.error_code(),
            message: err.to_string(),
        });
        (status, [("content-type", CONTENT_TYPE)], body).into_response()
    }
}
