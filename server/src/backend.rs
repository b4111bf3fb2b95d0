//! Relay to the external backend API.
//!
//! ARCHITECTURE
//! ============
//! Browser requests reach this server; the server rebuilds the outgoing
//! headers (content type, locale, cookies, bearer token) and forwards them.
//! Responses come back with status, content type, body and every
//! `Set-Cookie` header untouched, so the backend stays the owner of session
//! cookies.
//!
//! TRADE-OFFS
//! ==========
//! No retries and no redirect following: the browser sees exactly what the
//! backend answered, and a failure surfaces as one 502.

#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use std::time::Duration;

use axum::body::Bytes;
use axum::http::header::{ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use storefront::{Locale, User};

use crate::config::ServerConfig;

pub const X_LOCALE: HeaderName = HeaderName::from_static("x-locale");
pub const LOCALE_COOKIE: &str = "locale";
/// Cookies that may carry the bearer token, in lookup order.
pub const TOKEN_COOKIES: [&str; 2] = ["accessToken", "token"];

const JSON: &str = "application/json";

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    #[error("backend timed out")]
    Timeout,
    #[error("invalid backend response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Unreachable(e.to_string())
        }
    }
}

/// Request to relay. `path` is relative to the backend base URL and starts with `/`.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug, Clone)]
pub struct ForwardResponse {
    pub status: StatusCode,
    /// Only `Content-Type` and `Set-Cookie` survive.
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ForwardResponse {
    pub fn set_cookies(&self) -> impl Iterator<Item = &HeaderValue> {
        self.headers.get_all(SET_COOKIE).iter()
    }
}

#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn forward(&self, request: ForwardRequest) -> Result<ForwardResponse, BackendError>;
}

// =============================================================================
// HTTP BACKEND
// =============================================================================

pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ServerConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;
        Ok(Self { http, base_url: config.backend_url.clone() })
    }

    fn url_for(&self, request: &ForwardRequest) -> String {
        backend_url(&self.base_url, &request.path, request.query.as_deref())
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn forward(&self, request: ForwardRequest) -> Result<ForwardResponse, BackendError> {
        let url = self.url_for(&request);
        let method = request.method.clone();
        tracing::debug!(%method, %url, "forwarding to backend");

        let resp = self
            .http
            .request(request.method, &url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await?;

        let status = resp.status();
        let headers = relayable_headers(resp.headers());
        let body = resp.bytes().await?;

        if status.is_server_error() {
            tracing::warn!(%method, %url, %status, "backend error response");
        }
        Ok(ForwardResponse { status, headers, body })
    }
}

pub(crate) fn backend_url(base_url: &str, path: &str, query: Option<&str>) -> String {
    let path = path.trim_start_matches('/');
    match query.filter(|q| !q.is_empty()) {
        Some(q) => format!("{base_url}/{path}?{q}"),
        None => format!("{base_url}/{path}"),
    }
}

fn relayable_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(content_type) = upstream.get(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, content_type.clone());
    }
    for cookie in upstream.get_all(SET_COOKIE) {
        headers.append(SET_COOKIE, cookie.clone());
    }
    headers
}

// =============================================================================
// OUTGOING HEADERS
// =============================================================================

/// Locale for a request: `X-Locale` header, then `locale` cookie, then default.
#[must_use]
pub fn request_locale(inbound: &HeaderMap, default: Locale) -> Locale {
    let from_header = inbound
        .get(&X_LOCALE)
        .and_then(|v| v.to_str().ok())
        .and_then(Locale::from_tag);
    let from_cookie = || {
        CookieJar::from_headers(inbound)
            .get(LOCALE_COOKIE)
            .and_then(|c| Locale::from_tag(c.value()))
    };
    from_header.or_else(from_cookie).unwrap_or(default)
}

/// Bearer token: inbound `Authorization: Bearer` first, then token cookies.
#[must_use]
pub fn bearer_token(inbound: &HeaderMap) -> Option<String> {
    let from_header = inbound
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned);
    if from_header.is_some() {
        return from_header;
    }

    let jar = CookieJar::from_headers(inbound);
    TOKEN_COOKIES
        .iter()
        .filter_map(|name| jar.get(name))
        .map(|c| c.value().trim())
        .find(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Headers for the outgoing backend request.
#[must_use]
pub fn forward_headers(inbound: &HeaderMap, locale: Locale) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let content_type = inbound
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(JSON));
    headers.insert(CONTENT_TYPE, content_type);

    let locale_value = HeaderValue::from_static(locale.code());
    headers.insert(ACCEPT_LANGUAGE, locale_value.clone());
    headers.insert(X_LOCALE, locale_value);

    let cookies: Vec<&str> = inbound
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .collect();
    if !cookies.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&cookies.join("; ")) {
            headers.insert(COOKIE, value);
        }
    }

    if let Some(token) = bearer_token(inbound) {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(value) => {
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => tracing::warn!("dropping bearer token with invalid header characters"),
        }
    }

    headers
}

// =============================================================================
// AUTH CHECK
// =============================================================================

#[derive(Debug, Deserialize)]
struct AuthCheckResponse {
    #[serde(default)]
    success: bool,
    user: Option<User>,
}

/// Ask the backend who the request's credentials belong to.
///
/// `Ok(None)` means the backend answered but does not recognise the caller.
///
/// # Errors
///
/// Returns an error if the backend is unreachable or answers with an
/// undecodable success body.
pub async fn check_auth(backend: &dyn Backend, inbound: &HeaderMap, locale: Locale) -> Result<Option<User>, BackendError> {
    let request = ForwardRequest {
        method: Method::GET,
        path: "/auth/check".to_owned(),
        query: None,
        headers: forward_headers(inbound, locale),
        body: Bytes::new(),
    };
    let resp = backend.forward(request).await?;

    if resp.status == StatusCode::UNAUTHORIZED || resp.status == StatusCode::FORBIDDEN {
        return Ok(None);
    }
    if !resp.status.is_success() {
        return Err(BackendError::Unreachable(format!("auth check returned {}", resp.status)));
    }

    let body: AuthCheckResponse = serde_json::from_slice(&resp.body).map_err(|e| BackendError::Decode(e.to_string()))?;
    Ok(if body.success { body.user } else { None })
}
