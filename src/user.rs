//! User record as delivered by the backend API.
//!
//! DESIGN
//! ======
//! User types and roles are closed enums so every comparison is checked by
//! the compiler. Capabilities stay an open string set because the backend
//! adds them without client releases. Unrecognised role strings decode to
//! `Role::Unknown`, which never equals a distinguished role.

#[cfg(test)]
#[path = "user_test.rs"]
mod user_test;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

// =============================================================================
// USER TYPE
// =============================================================================

/// Coarse account category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Admin,
    Business,
    User,
}

impl UserType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Business => "business",
            Self::User => "user",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "business" => Ok(Self::Business),
            "user" => Ok(Self::User),
            other => Err(ParseEnumError { kind: "user type", value: other.to_owned() }),
        }
    }
}

// =============================================================================
// ROLE
// =============================================================================

/// Finer-grained label within a user type.
///
/// Unrecognised wire values collapse to `Unknown` and serialize back as
/// `"unknown"`; the original string is not kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Bypasses every capability check.
    SuperAdmin,
    Admin,
    CompanyOwner,
    CompanyManager,
    CompanyStaff,
    #[serde(other)]
    Unknown,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::CompanyOwner => "company_owner",
            Self::CompanyManager => "company_manager",
            Self::CompanyStaff => "company_staff",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "company_owner" => Ok(Self::CompanyOwner),
            "company_manager" => Ok(Self::CompanyManager),
            "company_staff" => Ok(Self::CompanyStaff),
            other => Err(ParseEnumError { kind: "role", value: other.to_owned() }),
        }
    }
}

// =============================================================================
// USER
// =============================================================================

/// Authenticated user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Backend identifier; numeric ids are kept as their decimal string.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub email: String,
    pub user_type: UserType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub capabilities: BTreeSet<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}

impl User {
    /// Name to show in navigation: full name when set, else the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email)
    }

    /// Shallow-merge every supplied field of `patch` into this record.
    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(id) = patch.id {
            self.id = id;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(user_type) = patch.user_type {
            self.user_type = user_type;
        }
        if let Some(role) = patch.role {
            self.role = Some(role);
        }
        if let Some(capabilities) = patch.capabilities {
            self.capabilities = capabilities;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(full_name) = patch.full_name {
            self.full_name = Some(full_name);
        }
        if let Some(avatar_url) = patch.avatar_url {
            self.avatar_url = Some(avatar_url);
        }
        if let Some(company_name) = patch.company_name {
            self.company_name = Some(company_name);
        }
    }
}

/// Partial user record for `SessionStore::update_user`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub id: Option<String>,
    pub email: Option<String>,
    pub user_type: Option<UserType>,
    pub role: Option<Role>,
    pub capabilities: Option<BTreeSet<String>>,
    pub status: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub company_name: Option<String>,
}

impl UserPatch {
    #[must_use]
    pub fn full_name(name: impl Into<String>) -> Self {
        Self { full_name: Some(name.into()), ..Self::default() }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(id) => Ok(id),
        serde_json::Value::Number(number) => Ok(number.to_string()),
        _ => Err(D::Error::custom("expected string or number id")),
    }
}

/// Missing and `null` both decode as `T::default()`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
