//! Locale-prefix routing middleware.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every page lives under `/{locale}/...`. API, health and asset paths pass
//! through untouched. Anything else is redirected to the caller's preferred
//! locale so links without a prefix keep working.

#[cfg(test)]
#[path = "locale_test.rs"]
mod tests;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::ACCEPT_LANGUAGE;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use storefront::Locale;
use storefront::locale::{localized_path, split_locale};

use crate::backend::LOCALE_COOKIE;
use crate::state::AppState;

const PASSTHROUGH_PREFIXES: [&str; 3] = ["/api/", "/assets/", "/healthz"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleRoute {
    Passthrough,
    Localized(Locale),
    Redirect(String),
}

/// Decide how a request path is routed.
#[must_use]
pub fn resolve(path: &str, query: Option<&str>, preferred: Locale) -> LocaleRoute {
    if path == "/api" || PASSTHROUGH_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return LocaleRoute::Passthrough;
    }
    if let (Some(locale), _) = split_locale(path) {
        return LocaleRoute::Localized(locale);
    }

    let target = localized_path(preferred, path);
    match query.filter(|q| !q.is_empty()) {
        Some(q) => LocaleRoute::Redirect(format!("{target}?{q}")),
        None => LocaleRoute::Redirect(target),
    }
}

/// Preferred locale for unprefixed paths: `locale` cookie, `Accept-Language`, default.
#[must_use]
pub fn preferred_locale(headers: &HeaderMap, default: Locale) -> Locale {
    let from_cookie = CookieJar::from_headers(headers)
        .get(LOCALE_COOKIE)
        .and_then(|c| Locale::from_tag(c.value()));
    let from_accept = || {
        headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .and_then(Locale::from_tag)
    };
    from_cookie.or_else(from_accept).unwrap_or(default)
}

pub async fn locale_routing(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let preferred = preferred_locale(req.headers(), state.config.default_locale);
    let route = resolve(req.uri().path(), req.uri().query(), preferred);

    match route {
        LocaleRoute::Passthrough => next.run(req).await,
        LocaleRoute::Localized(locale) => {
            req.extensions_mut().insert(locale);
            next.run(req).await
        }
        LocaleRoute::Redirect(target) => {
            tracing::debug!(from = %req.uri(), to = %target, "locale redirect");
            Redirect::temporary(&target).into_response()
        }
    }
}
