//! # state
//!
//! Top-level shared state injected into every Axum handler.

use std::sync::Arc;
use std::time::Instant;

use crate::store::SignalStore;

pub struct AppState {
    /// Signal table + event log. Supports concurrent callers: the listener
    /// agent inserts while the execution agent polls and reports.
    pub store: SignalStore,

    /// For the uptime figure in `/stats`.
    pub started_at: Instant,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            store: SignalStore::new(),
            started_at: Instant::now(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience type alias
pub type SharedState = Arc<AppState>;

pub fn build_state() -> SharedState {
    Arc::new(AppState::new())
}
