//! Generic `/api/*` relay to the backend.

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};

use crate::backend::{ForwardRequest, ForwardResponse, forward_headers, request_locale};
use crate::error::ApiError;
use crate::state::AppState;

/// Forward one request to backend `path`, rebuilding headers from `inbound`.
pub(crate) async fn relay(
    state: &AppState,
    method: Method,
    path: &str,
    query: Option<&str>,
    inbound: &HeaderMap,
    body: Bytes,
) -> Result<ForwardResponse, ApiError> {
    let locale = request_locale(inbound, state.config.default_locale);
    let request = ForwardRequest {
        method,
        path: format!("/{}", path.trim_start_matches('/')),
        query: query.map(str::to_owned),
        headers: forward_headers(inbound, locale),
        body,
    };
    Ok(state.backend.forward(request).await?)
}

/// Turn a backend answer into the browser response, Set-Cookie included.
pub(crate) fn into_response(resp: ForwardResponse) -> Response {
    let mut response = Response::new(Body::from(resp.body));
    *response.status_mut() = resp.status;
    response.headers_mut().extend(resp.headers);
    response
}

/// `ANY /api/{*path}` — relay to backend `/{path}`.
pub async fn forward(
    State(state): State<AppState>,
    Path(path): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match relay(&state, method, &path, uri.query(), &headers, body).await {
        Ok(resp) => into_response(resp),
        Err(e) => e.into_response(),
    }
}
