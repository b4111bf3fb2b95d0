//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! `/api/auth/*` and `/api/*` relay to the backend; `/{locale}/...` serves the
//! guarded pages. The locale middleware wraps everything, including the
//! fallback, so unprefixed page paths are redirected before routing matters.

pub mod auth;
pub mod pages;
pub mod proxy;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{any, get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::locale::locale_routing;
use crate::state::AppState;

/// Backend relay routes.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/check", get(auth::check))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/{*path}", any(proxy::forward))
}

/// Locale-prefixed pages.
fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/{locale}", get(pages::home))
        .route("/{locale}/login", get(pages::login))
        .route("/{locale}/unauthorized", get(pages::unauthorized))
        .route("/{locale}/account", get(pages::account))
        .route("/{locale}/admin", get(pages::admin))
        .route("/{locale}/admin/users", get(pages::admin_users))
        .route("/{locale}/business", get(pages::business))
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes())
        .merge(page_routes())
        .route("/healthz", get(healthz))
        .fallback(pages::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), locale_routing))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
