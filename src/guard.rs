//! Access-control consumers: conditional rendering and route guarding.
//!
//! SYSTEM CONTEXT
//! ==============
//! Both read a `Session` and never mutate it. Both delegate the actual
//! decision to `session::authorize`; they only differ in what a denial means
//! (fallback content vs. a redirect).

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use crate::locale::{Locale, localized_path};
use crate::session::{Decision, Denial, Requirement, Session, authorize};

pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

// =============================================================================
// CONDITIONAL RENDER
// =============================================================================

/// Renders children only for sessions that satisfy `requirement`.
#[derive(Debug, Clone, Default)]
pub struct Gate {
    requirement: Requirement,
}

impl Gate {
    #[must_use]
    pub fn new(requirement: Requirement) -> Self {
        Self { requirement }
    }

    #[must_use]
    pub fn allows(&self, session: &Session) -> bool {
        authorize(session, &self.requirement).is_granted()
    }

    pub fn render<T>(&self, session: &Session, children: impl FnOnce() -> T, fallback: impl FnOnce() -> T) -> T {
        if self.allows(session) { children() } else { fallback() }
    }

    /// Like `render` with an empty fallback.
    pub fn render_or_empty<T: Default>(&self, session: &Session, children: impl FnOnce() -> T) -> T {
        self.render(session, children, T::default)
    }
}

// =============================================================================
// ROUTE GUARD
// =============================================================================

/// Auth state as seen by a guard.
#[derive(Debug, Clone, Copy)]
pub enum AuthView<'a> {
    /// Session not resolved yet.
    Loading,
    Ready(&'a Session),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardView {
    Loading,
    Content,
    /// Denied; a redirect is in flight.
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardStep {
    pub view: GuardView,
    /// Set once per distinct denial.
    pub redirect: Option<String>,
}

/// Guards a page, redirecting once when the session does not qualify.
///
/// A new redirect is issued whenever the denial reason changes, so an
/// anonymous visitor sent to login who comes back with the wrong account is
/// then sent to the unauthorized page.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    requirement: Requirement,
    locale: Locale,
    /// Denial the last redirect was issued for.
    redirected_for: Option<Denial>,
}

impl RouteGuard {
    #[must_use]
    pub fn new(requirement: Requirement, locale: Locale) -> Self {
        Self { requirement, locale, redirected_for: None }
    }

    #[must_use]
    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    /// Change constraints; re-arms the redirect if they differ.
    pub fn set_requirement(&mut self, requirement: Requirement) {
        if self.requirement != requirement {
            self.requirement = requirement;
            self.redirected_for = None;
        }
    }

    pub fn evaluate(&mut self, auth: AuthView<'_>) -> GuardStep {
        let AuthView::Ready(session) = auth else {
            return GuardStep { view: GuardView::Loading, redirect: None };
        };

        match authorize(session, &self.requirement) {
            Decision::Granted => {
                self.redirected_for = None;
                GuardStep { view: GuardView::Content, redirect: None }
            }
            Decision::Denied(denial) => {
                let redirect = if self.redirected_for == Some(denial) {
                    None
                } else {
                    self.redirected_for = Some(denial);
                    tracing::debug!(?denial, locale = %self.locale, "route guard redirect");
                    Some(redirect_target(self.locale, denial))
                };
                GuardStep { view: GuardView::Blank, redirect }
            }
        }
    }
}

/// Login page for missing authentication, the unauthorized page otherwise.
#[must_use]
pub fn redirect_target(locale: Locale, denial: Denial) -> String {
    match denial {
        Denial::Unauthenticated => localized_path(locale, LOGIN_PATH),
        Denial::UserType | Denial::Role | Denial::Capability => localized_path(locale, UNAUTHORIZED_PATH),
    }
}
