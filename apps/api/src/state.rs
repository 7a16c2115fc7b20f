use std::sync::Arc;

use crate::config::Config;
use crate::report::config::LayoutConfig;
use crate::store::{PersonStore, SessionStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Case-file store. Production: `PgStore`; tests swap in the in-memory store.
    pub people: Arc<dyn PersonStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub config: Config,
    /// Sheet geometry, built once at startup.
    pub layout: Arc<LayoutConfig>,
}
