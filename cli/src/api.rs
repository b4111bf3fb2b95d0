//! HTTP client for the storefront `/api` surface.
//!
//! DESIGN
//! ======
//! Every request carries the locale headers and, when the session holds
//! one, the bearer token. A `401` from any authenticated call ends the
//! session: the store is logged out (which clears every session key) and
//! the caller gets `SessionExpired` with the localized login path.

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;

use reqwest::header::{ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storefront::guard::LOGIN_PATH;
use storefront::locale::localized_path;
use storefront::{Locale, SessionStorage, SessionStore, User, UserType};

use crate::CliError;

const X_LOCALE: HeaderName = HeaderName::from_static("x-locale");

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Body of `/api/auth/login` and `/api/auth/register` answers.
#[derive(Debug, Default, Deserialize)]
pub struct AuthEnvelope {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<AuthData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    pub user: User,
    pub access_token: String,
}

impl AuthEnvelope {
    /// User and token of a successful answer.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` when the backend reported failure or sent no data.
    pub fn into_credentials(self, status: StatusCode) -> Result<(User, String), CliError> {
        match (status.is_success() && self.success, self.data) {
            (true, Some(data)) if !data.access_token.is_empty() => Ok((data.user, data.access_token)),
            _ => Err(CliError::Rejected {
                status: status.as_u16(),
                message: self.message.unwrap_or_else(|| "authentication failed".to_owned()),
            }),
        }
    }
}

/// Body of `/api/auth/check`.
#[derive(Debug, Default, Deserialize)]
pub struct CheckEnvelope {
    #[serde(default)]
    pub success: bool,
    pub user: Option<User>,
}

#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration<'a> {
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<&'a str>,
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    locale: Locale,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns an error if `base_url` is not http(s) or the client cannot be built.
    pub fn new(base_url: &str, locale: Locale) -> Result<Self, CliError> {
        let base_url = base_url.trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(CliError::InvalidBaseUrl(base_url.to_owned()));
        }
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { http, base_url: base_url.to_owned(), locale })
    }

    #[must_use]
    pub fn locale(&self) -> Locale {
        self.locale
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Outgoing headers: JSON content type, both locale headers, bearer token if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the token contains characters invalid in a header.
    pub fn headers(&self, token: Option<&str>) -> Result<HeaderMap, CliError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let locale = HeaderValue::from_static(self.locale.code());
        headers.insert(ACCEPT_LANGUAGE, locale.clone());
        headers.insert(X_LOCALE, locale);
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
        }
        Ok(headers)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> Result<(StatusCode, Value), CliError> {
        let url = self.url(path);
        tracing::debug!(%method, %url, "api request");

        let request = self.http.request(method, &url).headers(self.headers(token)?);
        let request = match body {
            Some(json) => request.json(json),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        let value = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, value))
    }

    // -------------------------------------------------------------------------
    // auth endpoints
    // -------------------------------------------------------------------------

    /// `POST /api/auth/login`. On success the store holds the returned user and token.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` for refused credentials and transport errors as-is.
    pub async fn login<S: SessionStorage>(
        &self,
        store: &mut SessionStore<S>,
        credentials: &Credentials<'_>,
    ) -> Result<(), CliError> {
        let body = serde_json::to_value(credentials)?;
        let (status, value) = self.send(Method::POST, "/api/auth/login", None, Some(&body)).await?;
        let envelope = serde_json::from_value::<AuthEnvelope>(value).unwrap_or_default();
        let (user, token) = envelope.into_credentials(status)?;
        store.login(user, token);
        Ok(())
    }

    /// `POST /api/auth/register`. Backends that log the new account in
    /// straight away return credentials; otherwise the store is untouched.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` when registration is refused.
    pub async fn register<S: SessionStorage>(
        &self,
        store: &mut SessionStore<S>,
        registration: &Registration<'_>,
    ) -> Result<Option<String>, CliError> {
        let body = serde_json::to_value(registration)?;
        let (status, value) = self.send(Method::POST, "/api/auth/register", None, Some(&body)).await?;
        let envelope = serde_json::from_value::<AuthEnvelope>(value).unwrap_or_default();
        if !envelope.success || !status.is_success() {
            return Err(CliError::Rejected {
                status: status.as_u16(),
                message: envelope.message.unwrap_or_else(|| "registration failed".to_owned()),
            });
        }
        let message = envelope.message.clone();
        if envelope.data.is_some() {
            let (user, token) = envelope.into_credentials(status)?;
            store.login(user, token);
        }
        Ok(message)
    }

    /// `GET /api/auth/check`. Refreshes the stored user from the backend.
    ///
    /// # Errors
    ///
    /// Returns `NotLoggedIn` without a session and `SessionExpired` on 401.
    pub async fn refresh<S: SessionStorage>(&self, store: &mut SessionStore<S>) -> Result<(), CliError> {
        let token = store.access_token().ok_or(CliError::NotLoggedIn)?.to_owned();
        let (status, value) = self.send(Method::GET, "/api/auth/check", Some(&token), None).await?;
        expire_on_unauthorized(store, status, self.locale)?;
        ensure_success(status, &value)?;

        let envelope = serde_json::from_value::<CheckEnvelope>(value).unwrap_or_default();
        match envelope.user.filter(|_| envelope.success) {
            Some(user) => {
                store.login(user, token);
                Ok(())
            }
            None => {
                store.logout();
                Err(CliError::SessionExpired { login_path: localized_path(self.locale, LOGIN_PATH) })
            }
        }
    }

    /// `POST /api/auth/logout`, then clear the local session whatever the answer.
    pub async fn logout<S: SessionStorage>(&self, store: &mut SessionStore<S>) {
        let token = store.access_token().map(str::to_owned);
        if let Err(e) = self.send(Method::POST, "/api/auth/logout", token.as_deref(), None).await {
            tracing::warn!(error = %e, "server logout failed; clearing local session");
        }
        store.logout();
    }

    // -------------------------------------------------------------------------
    // generic request helper
    // -------------------------------------------------------------------------

    /// Authenticated request to any `/api` path.
    ///
    /// # Errors
    ///
    /// Returns `SessionExpired` on 401 (after clearing the session) and
    /// `Rejected` for any other non-success status.
    pub async fn request<S: SessionStorage>(
        &self,
        store: &mut SessionStore<S>,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, CliError> {
        let token = store.access_token().map(str::to_owned);
        let (status, value) = self.send(method, path, token.as_deref(), body).await?;
        expire_on_unauthorized(store, status, self.locale)?;
        ensure_success(status, &value)?;
        Ok(value)
    }
}

/// End the session when the server answered 401.
///
/// # Errors
///
/// Returns `SessionExpired` carrying the localized login path.
pub fn expire_on_unauthorized<S: SessionStorage>(
    store: &mut SessionStore<S>,
    status: StatusCode,
    locale: Locale,
) -> Result<(), CliError> {
    if status != StatusCode::UNAUTHORIZED {
        return Ok(());
    }
    tracing::info!("server rejected credentials; clearing session");
    store.logout();
    Err(CliError::SessionExpired { login_path: localized_path(locale, LOGIN_PATH) })
}

fn ensure_success(status: StatusCode, value: &Value) -> Result<(), CliError> {
    if status.is_success() {
        return Ok(());
    }
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .map_or_else(|| value.to_string(), ToOwned::to_owned);
    Err(CliError::Rejected { status: status.as_u16(), message })
}
