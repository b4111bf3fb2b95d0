//! Write-through session store.
//!
//! ARCHITECTURE
//! ============
//! One store per client lifetime, passed explicitly to whoever needs it. The
//! in-memory `Session` is authoritative; storage is a mirror rewritten after
//! every transition and read exactly once, in `open`.
//!
//! States: Anonymous and Authenticated. `login` is the only way in,
//! `logout` the only way out, `update_user` loops on Authenticated.
//!
//! ERROR HANDLING
//! ==============
//! Every operation is total. Unreadable or inconsistent storage rehydrates
//! as Anonymous; failed writes are logged and the in-memory state stands.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use crate::session::{Requirement, Session, authorize};
use crate::storage::{AUTH_STORAGE_KEY, SessionStorage, clear_session_keys};
use crate::user::{Role, User, UserPatch, UserType};

pub struct SessionStore<S> {
    session: Session,
    storage: S,
}

impl<S: SessionStorage> SessionStore<S> {
    /// Rehydrate from `storage`, falling back to Anonymous.
    pub fn open(storage: S) -> Self {
        let session = rehydrate(&storage);
        Self { session, storage }
    }

    // -------------------------------------------------------------------------
    // transitions
    // -------------------------------------------------------------------------

    /// Replace the session with `user` + `access_token` and mark it authenticated.
    pub fn login(&mut self, user: User, access_token: impl Into<String>) {
        tracing::info!(user_id = %user.id, user_type = %user.user_type, "session login");
        self.session = Session::authenticated(user, access_token);
        self.persist();
    }

    /// Reset to Anonymous and purge every session key from storage.
    pub fn logout(&mut self) {
        if self.session.is_authenticated {
            tracing::info!("session logout");
        }
        self.session = Session::anonymous();
        if clear_session_keys(&mut self.storage).is_err() {
            tracing::debug!("logout left session keys behind; see per-key warnings");
        }
    }

    /// Merge `patch` into the current user. No-op when nobody is logged in.
    pub fn update_user(&mut self, patch: UserPatch) {
        let Some(user) = self.session.user.as_mut() else {
            tracing::debug!("update_user ignored: no current user");
            return;
        };
        user.apply(patch);
        self.persist();
    }

    // -------------------------------------------------------------------------
    // accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.session.user.as_ref()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.session.access_token.as_deref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    // -------------------------------------------------------------------------
    // decisions
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn has_capability(&self, capability: &str) -> bool {
        self.session.has_capability(capability)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.session.is_admin()
    }

    #[must_use]
    pub fn is_company_owner(&self) -> bool {
        self.session.is_company_owner()
    }

    #[must_use]
    pub fn is_company_manager(&self) -> bool {
        self.session.is_company_manager()
    }

    #[must_use]
    pub fn can_access(&self, user_type: Option<UserType>, role: Option<Role>, capability: Option<&str>) -> bool {
        self.session.can_access(user_type, role, capability)
    }

    #[must_use]
    pub fn satisfies(&self, requirement: &Requirement) -> bool {
        authorize(&self.session, requirement).is_granted()
    }

    fn persist(&mut self) {
        let raw = match serde_json::to_string(&self.session) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "session serialization failed");
                return;
            }
        };
        if let Err(e) = self.storage.set_item(AUTH_STORAGE_KEY, &raw) {
            tracing::warn!(error = %e, "session persist failed");
        }
    }
}

fn rehydrate<S: SessionStorage>(storage: &S) -> Session {
    let raw = match storage.get_item(AUTH_STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Session::anonymous(),
        Err(e) => {
            tracing::warn!(error = %e, "session storage unreadable; starting anonymous");
            return Session::anonymous();
        }
    };

    match serde_json::from_str::<Session>(&raw) {
        Ok(session) if session.is_consistent() => session,
        Ok(_) => {
            tracing::warn!("stored session inconsistent; starting anonymous");
            Session::anonymous()
        }
        Err(e) => {
            tracing::warn!(error = %e, "stored session corrupt; starting anonymous");
            Session::anonymous()
        }
    }
}
