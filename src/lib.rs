//! Storefront session and access-control core.
//!
//! SYSTEM CONTEXT
//! ==============
//! Shared by the HTTP server (guarded pages, backend relay) and the CLI
//! client (durable session). Everything here is synchronous and pure apart
//! from the storage port the session store writes through.
//!
//! LAYOUT
//! ======
//! - `user`: user record, user types, roles, partial updates.
//! - `session`: session value and the single authorization decision.
//! - `storage`: durable key/value port with memory and file backends.
//! - `store`: the write-through session store.
//! - `guard`: conditional-render gate and route guard.
//! - `locale`: language prefixes for paths.

pub mod guard;
pub mod locale;
pub mod session;
pub mod storage;
pub mod store;
pub mod user;

pub use guard::{AuthView, Gate, GuardStep, GuardView, RouteGuard};
pub use locale::Locale;
pub use session::{Decision, Denial, Requirement, Session, authorize};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError};
pub use store::SessionStore;
pub use user::{ParseEnumError, Role, User, UserPatch, UserType};
