//! Server configuration parsed from environment variables.

use storefront::Locale;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8080/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Backend API base URL, without trailing slash.
    pub backend_url: String,
    pub default_locale: Locale,
    /// Mark cookies written by this server `Secure`.
    pub cookie_secure: bool,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            backend_url: DEFAULT_BACKEND_URL.to_owned(),
            default_locale: Locale::default(),
            cookie_secure: false,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl ServerConfig {
    /// Build typed config from environment variables.
    ///
    /// - `PORT`: default 3000
    /// - `BACKEND_API_URL`: default `http://127.0.0.1:8080/api`
    /// - `DEFAULT_LOCALE`: `vi` (default) or `en`
    /// - `COOKIE_SECURE`: boolean; inferred from an `https://` backend URL when unset
    /// - `BACKEND_REQUEST_TIMEOUT_SECS`: default 30
    /// - `BACKEND_CONNECT_TIMEOUT_SECS`: default 5
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env_parse("PORT", DEFAULT_PORT)?;
        let backend_url = std::env::var("BACKEND_API_URL")
            .unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        if !(backend_url.starts_with("http://") || backend_url.starts_with("https://")) {
            return Err(ConfigError::Invalid { var: "BACKEND_API_URL", value: backend_url });
        }

        let default_locale = match std::env::var("DEFAULT_LOCALE") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid { var: "DEFAULT_LOCALE", value: raw })?,
            Err(_) => Locale::default(),
        };

        let cookie_secure = env_bool("COOKIE_SECURE").unwrap_or_else(|| backend_url.starts_with("https://"));

        Ok(Self {
            port,
            backend_url,
            default_locale,
            cookie_secure,
            request_timeout_secs: env_parse("BACKEND_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_timeout_secs: env_parse("BACKEND_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        })
    }
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

fn env_parse<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { var: key, value: raw }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
