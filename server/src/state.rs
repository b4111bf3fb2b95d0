//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the parsed config and the backend relay. The server keeps no
//! session state of its own: every request's identity is whatever the
//! backend says its cookies and bearer token belong to.

use std::sync::Arc;

use crate::backend::Backend;
use crate::config::ServerConfig;

/// Clone is required by Axum; inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub backend: Arc<dyn Backend>,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig, backend: Arc<dyn Backend>) -> Self {
        Self { config: Arc::new(config), backend }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
