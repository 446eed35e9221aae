//! # routes::monitor
//!
//! Health + aggregate statistics.
//!
//! | Method | Path      | Description                          |
//! |--------|-----------|--------------------------------------|
//! | GET    | `/health` | Liveness probe (auth-exempt)         |
//! | GET    | `/stats`  | Counts by status, events, uptime     |

use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

use crate::state::SharedState;

/// GET /health — used by the listener agent before it starts processing.
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "ok":        true,
        "status":    "healthy",
        "timestamp": Utc::now(),
        "server":    "semaphore",
    }))
}

/// GET /stats — aggregate signal counts by status plus total event count.
pub async fn stats(State(state): State<SharedState>) -> impl IntoResponse {
    let stats = state.store.stats().await;

    Json(json!({
        "ok":                true,
        "total_signals":     stats.total_signals,
        "pending_signals":   stats.pending_signals,
        "active_signals":    stats.active_signals,
        "completed_signals": stats.completed_signals,
        "failed_signals":    stats.failed_signals,
        "total_events":      stats.total_events,
        "server_uptime":     state.started_at.elapsed().as_secs(),
    }))
}
