//! Supported UI languages and locale-prefixed paths.

#[cfg(test)]
#[path = "locale_test.rs"]
mod locale_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::user::ParseEnumError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Vi,
    En,
}

impl Locale {
    pub const ALL: [Self; 2] = [Self::Vi, Self::En];

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Vi => "vi",
            Self::En => "en",
        }
    }

    /// Parse a bare code or the primary tag of a header value (`en-US,en;q=0.9`).
    #[must_use]
    pub fn from_tag(raw: &str) -> Option<Self> {
        let primary = raw
            .split([',', ';'])
            .next()
            .unwrap_or_default()
            .split(['-', '_'])
            .next()
            .unwrap_or_default();
        primary.parse().ok()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vi" => Ok(Self::Vi),
            "en" => Ok(Self::En),
            other => Err(ParseEnumError { kind: "locale", value: other.to_owned() }),
        }
    }
}

/// Split a leading locale segment off `path`.
///
/// `/en/admin` yields `(Some(En), "/admin")`, `/en` yields `(Some(En), "/")`
/// and unprefixed paths come back unchanged.
#[must_use]
pub fn split_locale(path: &str) -> (Option<Locale>, &str) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let (first, rest) = match trimmed.find('/') {
        Some(idx) => (&trimmed[..idx], &trimmed[idx..]),
        None => (trimmed, "/"),
    };
    // Only exact lowercase codes count as a prefix.
    match Locale::ALL.into_iter().find(|l| l.code() == first) {
        Some(locale) => (Some(locale), rest),
        None => (None, path),
    }
}

/// Prefix `path` with `locale`: `/login` becomes `/vi/login`, `/` becomes `/vi`.
#[must_use]
pub fn localized_path(locale: Locale, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        format!("/{locale}")
    } else {
        format!("/{locale}/{path}")
    }
}
