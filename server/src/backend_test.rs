use super::*;
use crate::state::test_helpers::{MockBackend, auth_check_ok, user_json};
use storefront::UserType;

fn headers(pairs: &[(HeaderName, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.append(name.clone(), HeaderValue::from_str(value).unwrap());
    }
    map
}

// =============================================================================
// backend_url
// =============================================================================

#[test]
fn backend_url_joins_path_and_query() {
    assert_eq!(backend_url("http://b/api", "/auctions", None), "http://b/api/auctions");
    assert_eq!(backend_url("http://b/api", "auctions", Some("page=2")), "http://b/api/auctions?page=2");
    assert_eq!(backend_url("http://b/api", "/auctions", Some("")), "http://b/api/auctions");
}

// =============================================================================
// forward_headers
// =============================================================================

#[test]
fn forward_headers_defaults_content_type_and_sets_both_locale_forms() {
    let out = forward_headers(&HeaderMap::new(), Locale::En);
    assert_eq!(out.get(CONTENT_TYPE).unwrap(), "application/json");
    assert_eq!(out.get(ACCEPT_LANGUAGE).unwrap(), "en");
    assert_eq!(out.get(&X_LOCALE).unwrap(), "en");
    assert!(out.get(COOKIE).is_none());
    assert!(out.get(AUTHORIZATION).is_none());
}

#[test]
fn forward_headers_keeps_inbound_content_type() {
    let inbound = headers(&[(CONTENT_TYPE, "multipart/form-data; boundary=x")]);
    let out = forward_headers(&inbound, Locale::Vi);
    assert_eq!(out.get(CONTENT_TYPE).unwrap(), "multipart/form-data; boundary=x");
}

#[test]
fn forward_headers_joins_all_cookies() {
    let inbound = headers(&[(COOKIE, "a=1; b=2"), (COOKIE, "c=3")]);
    let out = forward_headers(&inbound, Locale::Vi);
    assert_eq!(out.get(COOKIE).unwrap(), "a=1; b=2; c=3");
}

#[test]
fn forward_headers_derives_bearer_from_cookie() {
    let inbound = headers(&[(COOKIE, "theme=dark; accessToken=abc123")]);
    let out = forward_headers(&inbound, Locale::Vi);
    assert_eq!(out.get(AUTHORIZATION).unwrap(), "Bearer abc123");
    assert_eq!(out.get(COOKIE).unwrap(), "theme=dark; accessToken=abc123");
}

#[test]
fn forward_headers_passes_inbound_bearer() {
    let inbound = headers(&[(AUTHORIZATION, "Bearer from-header"), (COOKIE, "token=from-cookie")]);
    let out = forward_headers(&inbound, Locale::Vi);
    assert_eq!(out.get(AUTHORIZATION).unwrap(), "Bearer from-header");
}

// =============================================================================
// bearer_token / request_locale
// =============================================================================

#[test]
fn bearer_token_lookup_order() {
    assert_eq!(bearer_token(&headers(&[(COOKIE, "token=legacy")])).as_deref(), Some("legacy"));
    assert_eq!(
        bearer_token(&headers(&[(COOKIE, "token=legacy; accessToken=current")])).as_deref(),
        Some("current")
    );
    assert_eq!(bearer_token(&headers(&[(AUTHORIZATION, "Basic abc")])), None);
    assert_eq!(bearer_token(&headers(&[(AUTHORIZATION, "Bearer   ")])), None);
    assert_eq!(bearer_token(&headers(&[(COOKIE, "accessToken=")])), None);
}

#[test]
fn request_locale_prefers_header_then_cookie() {
    assert_eq!(request_locale(&HeaderMap::new(), Locale::Vi), Locale::Vi);
    assert_eq!(request_locale(&headers(&[(COOKIE, "locale=en")]), Locale::Vi), Locale::En);
    assert_eq!(
        request_locale(&headers(&[(X_LOCALE, "vi"), (COOKIE, "locale=en")]), Locale::En),
        Locale::Vi
    );
    assert_eq!(request_locale(&headers(&[(X_LOCALE, "de")]), Locale::En), Locale::En);
}

// =============================================================================
// relayable_headers
// =============================================================================

#[test]
fn relayable_headers_keeps_content_type_and_every_set_cookie() {
    let upstream = headers(&[
        (CONTENT_TYPE, "application/json"),
        (SET_COOKIE, "accessToken=a; Path=/; HttpOnly"),
        (SET_COOKIE, "refreshToken=r; Path=/; HttpOnly"),
        (HeaderName::from_static("x-powered-by"), "Express"),
    ]);
    let out = relayable_headers(&upstream);
    assert_eq!(out.len(), 3);
    let cookies: Vec<_> = out.get_all(SET_COOKIE).iter().collect();
    assert_eq!(cookies, ["accessToken=a; Path=/; HttpOnly", "refreshToken=r; Path=/; HttpOnly"]);
    assert!(out.get("x-powered-by").is_none());
}

// =============================================================================
// check_auth
// =============================================================================

#[tokio::test]
async fn check_auth_returns_user_on_success() {
    let backend = MockBackend::new();
    backend.push_json(StatusCode::OK, auth_check_ok(user_json(UserType::Admin, None, &[])));

    let inbound = headers(&[(COOKIE, "accessToken=abc")]);
    let user = check_auth(&backend, &inbound, Locale::En).await.unwrap().unwrap();
    assert_eq!(user.user_type, UserType::Admin);

    let sent = backend.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, Method::GET);
    assert_eq!(sent[0].path, "/auth/check");
    assert_eq!(sent[0].headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
    assert_eq!(sent[0].headers.get(&X_LOCALE).unwrap(), "en");
}

#[tokio::test]
async fn check_auth_unauthorized_is_none() {
    let backend = MockBackend::new();
    backend.push_json(StatusCode::UNAUTHORIZED, serde_json::json!({ "success": false, "message": "expired" }));
    assert!(check_auth(&backend, &HeaderMap::new(), Locale::Vi).await.unwrap().is_none());
}

#[tokio::test]
async fn check_auth_success_false_is_none() {
    let backend = MockBackend::new();
    backend.push_json(StatusCode::OK, serde_json::json!({ "success": false }));
    assert!(check_auth(&backend, &HeaderMap::new(), Locale::Vi).await.unwrap().is_none());
}

#[tokio::test]
async fn check_auth_server_error_is_err() {
    let backend = MockBackend::new();
    backend.push_json(StatusCode::INTERNAL_SERVER_ERROR, serde_json::json!({}));
    assert!(check_auth(&backend, &HeaderMap::new(), Locale::Vi).await.is_err());
}

#[tokio::test]
async fn check_auth_unreachable_is_err() {
    let backend = MockBackend::new();
    backend.push_failure("connection refused");
    let err = check_auth(&backend, &HeaderMap::new(), Locale::Vi).await.unwrap_err();
    assert!(matches!(err, BackendError::Unreachable(_)));
}
