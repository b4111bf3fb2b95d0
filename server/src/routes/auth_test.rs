use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::{HeaderValue, StatusCode};
use storefront::{Role, UserType};

use super::*;
use crate::state::test_helpers::{MockBackend, auth_check_ok, test_app_state, user_json};

async fn extract(state: &AppState, headers: &[(axum::http::HeaderName, &str)]) -> Session {
    let mut req = axum::http::Request::builder().uri("/vi/account");
    for (name, value) in headers {
        req = req.header(name.clone(), *value);
    }
    let (mut parts, ()) = req.body(()).unwrap().into_parts();
    let Ok(CurrentSession(session)) = CurrentSession::from_request_parts(&mut parts, state).await;
    session
}

// =============================================================================
// expired_cookie
// =============================================================================

#[test]
fn expired_cookie_clears_value_and_expires_now() {
    let cookie = expired_cookie("accessToken", false);
    assert_eq!(cookie.name(), "accessToken");
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    assert_eq!(cookie.secure(), Some(false));
}

#[test]
fn expired_cookie_honours_secure_flag() {
    let cookie = expired_cookie("token", true);
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.http_only(), Some(true));
}

// =============================================================================
// CurrentSession
// =============================================================================

#[tokio::test]
async fn no_credentials_is_anonymous_without_backend_call() {
    let backend = Arc::new(MockBackend::new());
    let state = test_app_state(Arc::clone(&backend));

    let session = extract(&state, &[]).await;
    assert!(!session.is_authenticated);
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn recognised_token_yields_authenticated_session() {
    let backend = Arc::new(MockBackend::new());
    backend.push_json(
        StatusCode::OK,
        auth_check_ok(user_json(UserType::Business, Some(Role::CompanyManager), &["orders.view"])),
    );
    let state = test_app_state(Arc::clone(&backend));

    let session = extract(&state, &[(AUTHORIZATION, "Bearer abc")]).await;
    assert!(session.is_authenticated);
    assert_eq!(session.access_token.as_deref(), Some("abc"));
    assert!(session.is_company_manager());
    assert!(session.has_capability("orders.view"));

    let sent = backend.requests();
    assert_eq!(sent[0].path, "/auth/check");
    assert_eq!(sent[0].headers.get(AUTHORIZATION), Some(&HeaderValue::from_static("Bearer abc")));
}

#[tokio::test]
async fn rejected_token_is_anonymous() {
    let backend = Arc::new(MockBackend::new());
    backend.push_json(StatusCode::UNAUTHORIZED, serde_json::json!({ "success": false }));
    let state = test_app_state(Arc::clone(&backend));

    let session = extract(&state, &[(COOKIE, "accessToken=stale")]).await;
    assert!(!session.is_authenticated);
    assert!(session.user.is_none());
}

#[tokio::test]
async fn backend_outage_is_anonymous() {
    let backend = Arc::new(MockBackend::new());
    backend.push_failure("connection refused");
    let state = test_app_state(Arc::clone(&backend));

    let session = extract(&state, &[(COOKIE, "token=legacy")]).await;
    assert!(!session.is_authenticated);
}

#[tokio::test]
async fn unsuccessful_check_body_is_anonymous() {
    let backend = Arc::new(MockBackend::new());
    backend.push_json(StatusCode::OK, serde_json::json!({ "success": false, "user": null }));
    let state = test_app_state(Arc::clone(&backend));

    let session = extract(&state, &[(COOKIE, "accessToken=t")]).await;
    assert!(!session.is_authenticated);
}

// =============================================================================
// logout
// =============================================================================

#[tokio::test]
async fn logout_relays_backend_cookies_before_expiries() {
    let backend = Arc::new(MockBackend::new());
    backend.push_json_with_cookies(
        StatusCode::OK,
        serde_json::json!({ "success": true }),
        &["refreshToken=; Path=/; Max-Age=0"],
    );
    let state = test_app_state(Arc::clone(&backend));

    let resp = logout(State(state), HeaderMap::new()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookies: Vec<&str> = resp
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect();
    assert_eq!(cookies.len(), 3);
    assert!(cookies[0].starts_with("refreshToken="));
    assert!(cookies[1..].iter().all(|c| c.contains("Max-Age=0")));
    assert_eq!(backend.requests()[0].path, "/auth/logout");
}
