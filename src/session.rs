//! Session value and the authorization decision.
//!
//! DESIGN
//! ======
//! `authorize` is the only place the conjunctive access rule lives. The
//! session helpers, the conditional-render gate and the route guard all call
//! it. Constraints are checked in a fixed order (authentication, user type,
//! role, capability) so the first failure can pick the redirect target.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use serde::{Deserialize, Serialize};

use crate::user::{Role, User, UserType};

// =============================================================================
// SESSION
// =============================================================================

/// Who is logged in, with which token.
///
/// `is_authenticated` is true iff `user` and `access_token` were set together
/// by the last login and no logout followed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub is_authenticated: bool,
}

impl Session {
    /// The empty anonymous session.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn authenticated(user: User, access_token: impl Into<String>) -> Self {
        Self { user: Some(user), access_token: Some(access_token.into()), is_authenticated: true }
    }

    /// True for the two shapes a store can produce: user, token and flag all
    /// set, or none of them.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let has_user = self.user.is_some();
        has_user == self.access_token.is_some() && has_user == self.is_authenticated
    }

    /// Capability check; `super_admin` holds every capability.
    #[must_use]
    pub fn has_capability(&self, capability: &str) -> bool {
        self.user.as_ref().is_some_and(|user| {
            user.role == Some(Role::SuperAdmin) || user.capabilities.contains(capability)
        })
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user
            .as_ref()
            .is_some_and(|user| user.user_type == UserType::Admin)
    }

    #[must_use]
    pub fn is_company_owner(&self) -> bool {
        self.is_business_with_role(Role::CompanyOwner)
    }

    #[must_use]
    pub fn is_company_manager(&self) -> bool {
        self.is_business_with_role(Role::CompanyManager)
    }

    fn is_business_with_role(&self, role: Role) -> bool {
        self.user
            .as_ref()
            .is_some_and(|user| user.user_type == UserType::Business && user.role == Some(role))
    }

    /// General-purpose gate: every supplied constraint must hold.
    #[must_use]
    pub fn can_access(&self, user_type: Option<UserType>, role: Option<Role>, capability: Option<&str>) -> bool {
        let requirement = Requirement { user_type, role, capability: capability.map(str::to_owned) };
        authorize(self, &requirement).is_granted()
    }
}

// =============================================================================
// REQUIREMENT / DECISION
// =============================================================================

/// Constraints a session must satisfy. `None` fields are vacuously satisfied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirement {
    pub user_type: Option<UserType>,
    pub role: Option<Role>,
    pub capability: Option<String>,
}

impl Requirement {
    /// Only requires a logged-in user.
    #[must_use]
    pub fn authenticated() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn user_type(mut self, user_type: UserType) -> Self {
        self.user_type = Some(user_type);
        self
    }

    #[must_use]
    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    #[must_use]
    pub fn capability(mut self, capability: impl Into<String>) -> Self {
        self.capability = Some(capability.into());
        self
    }
}

/// Which constraint failed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Unauthenticated,
    UserType,
    Role,
    Capability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Granted,
    Denied(Denial),
}

impl Decision {
    #[must_use]
    pub fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Evaluate `requirement` against `session`.
///
/// Order: user present, user type, role, capability. The first failing
/// constraint is returned.
#[must_use]
pub fn authorize(session: &Session, requirement: &Requirement) -> Decision {
    let Some(user) = session.user.as_ref() else {
        return Decision::Denied(Denial::Unauthenticated);
    };

    if let Some(user_type) = requirement.user_type {
        if user.user_type != user_type {
            return Decision::Denied(Denial::UserType);
        }
    }

    if let Some(role) = requirement.role {
        if user.role != Some(role) {
            return Decision::Denied(Denial::Role);
        }
    }

    if let Some(capability) = requirement.capability.as_deref() {
        if !session.has_capability(capability) {
            return Decision::Denied(Denial::Capability);
        }
    }

    Decision::Granted
}
