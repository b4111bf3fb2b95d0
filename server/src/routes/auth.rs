//! Auth routes — login/register/check/logout relays and the session extractor.

use std::convert::Infallible;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{FromRef, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use storefront::{Locale, Session};
use time::Duration;

use super::proxy::{into_response, relay};
use crate::backend::{TOKEN_COOKIES, bearer_token, check_auth};
use crate::state::AppState;

// =============================================================================
// SESSION EXTRACTOR
// =============================================================================

/// Session of the caller as resolved by the backend auth check.
///
/// Never rejects: missing credentials, an unknown token, or an unreachable
/// backend all yield the anonymous session.
pub struct CurrentSession(pub Session);

impl<S> axum::extract::FromRequestParts<S> for CurrentSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            return Ok(Self(Session::anonymous()));
        };

        let app_state = AppState::from_ref(state);
        let locale = parts
            .extensions
            .get::<Locale>()
            .copied()
            .unwrap_or(app_state.config.default_locale);

        match check_auth(app_state.backend.as_ref(), &parts.headers, locale).await {
            Ok(Some(user)) => Ok(Self(Session::authenticated(user, token))),
            Ok(None) => Ok(Self(Session::anonymous())),
            Err(e) => {
                tracing::warn!(error = %e, "auth check failed; treating caller as anonymous");
                Ok(Self(Session::anonymous()))
            }
        }
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /api/auth/login` — relay credentials, pass session cookies back.
pub async fn login(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    relay_auth(&state, Method::POST, "/auth/login", &headers, body, "login").await
}

/// `POST /api/auth/register`
pub async fn register(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    relay_auth(&state, Method::POST, "/auth/register", &headers, body, "register").await
}

/// `GET /api/auth/check` — current user per backend, 401 when unknown.
pub async fn check(State(state): State<AppState>, headers: HeaderMap) -> Response {
    relay_auth(&state, Method::GET, "/auth/check", &headers, Bytes::new(), "check").await
}

/// `POST /api/auth/logout` — tell the backend, then expire token cookies regardless.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let relayed = match relay(&state, Method::POST, "/auth/logout", None, &headers, Bytes::new()).await {
        Ok(resp) => resp.set_cookies().cloned().collect::<Vec<_>>(),
        Err(e) => {
            tracing::warn!(error = %e, "backend logout failed; clearing cookies locally");
            Vec::new()
        }
    };

    let jar = TOKEN_COOKIES
        .iter()
        .fold(CookieJar::new(), |jar, name| jar.add(expired_cookie(name, state.config.cookie_secure)));
    let mut response = Json(serde_json::json!({ "success": true, "message": "Logged out" })).into_response();
    for cookie in relayed {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    // Expiries go last so they win over anything the backend re-set.
    (jar, response).into_response()
}

async fn relay_auth(
    state: &AppState,
    method: Method,
    path: &str,
    headers: &HeaderMap,
    body: Bytes,
    action: &'static str,
) -> Response {
    match relay(state, method, path, None, headers, body).await {
        Ok(resp) => {
            if resp.status.is_success() {
                tracing::info!(action, "auth request accepted");
            } else if resp.status.is_client_error() {
                tracing::info!(action, status = %resp.status, "auth request rejected");
            }
            into_response(resp)
        }
        Err(e) => e.into_response(),
    }
}

pub(crate) fn expired_cookie(name: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((name.to_owned(), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
