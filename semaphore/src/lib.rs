//! # Semaphore — Signal Server
//!
//! ```text
//!  ┌─────────────┐  POST /add_signal           ┌──────────────────────────┐
//!  │  Spyglass   │ ──────────────────────────▶ │ SignalStore              │
//!  │  (listener) │                             │ ├─ signals (by id)       │
//!  └─────────────┘                             │ ├─ message_id index      │
//!                                              │ └─ trade_events (append) │
//!  ┌─────────────┐  GET  /get_pending_signals  └──────────┬───────────────┘
//!  │  Execution  │ ◀──────────────────────────            │ replay
//!  │  Agent (EA) │  POST /report_event                    ▼
//!  └─────────────┘  GET  /get_signal_state/:id   ReconciledState
//! ```
//!
//! The store is the single source of truth; reconciled state is recomputed
//! from the event log on every read, never cached.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod auth;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod routes;
pub mod state;
pub mod store;

use routes::{
    gate::{add_signal, get_pending_signals, get_signal_state, report_event},
    monitor::{health, stats},
};
use state::SharedState;

/// Build the full router. Shared between `main` and the integration tests.
pub fn app(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Dispatch Gate ─────────────────────────────────────────────────────
        .route("/add_signal",                     post(add_signal))
        .route("/get_pending_signals",            get(get_pending_signals))
        .route("/report_event",                   post(report_event))
        .route("/get_signal_state/:message_id",   get(get_signal_state))
        // ── Monitor ───────────────────────────────────────────────────────────
        .route("/health",                         get(health))
        .route("/stats",                          get(stats))
        // ── Middleware ────────────────────────────────────────────────────────
        .layer(axum::middleware::from_fn(auth::require_api_key))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
