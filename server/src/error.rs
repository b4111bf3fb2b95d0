//! HTTP error mapping for relay failures.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::backend::BackendError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub(crate) fn api_error_to_status(err: &ApiError) -> StatusCode {
    match err {
        ApiError::Backend(BackendError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
        ApiError::Backend(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = api_error_to_status(&self);
        tracing::error!(error = %self, %status, "backend relay failed");
        let body = serde_json::json!({
            "success": false,
            "message": "Backend service unavailable",
        });
        (status, Json(body)).into_response()
    }
}
