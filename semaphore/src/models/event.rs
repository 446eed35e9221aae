//! # models::event
//!
//! [`TradeEvent`] — one append-only lifecycle entry per execution-agent
//! report. Immutable once written; the event log is the source of truth the
//! reconciler replays.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SignalStatus;

// ─── Well-known event types ───────────────────────────────────────────────────
//
// `event_type` is an open string enum: the agent may report anything, only
// these carry store-level meaning.

pub const ORDER_PLACED: &str = "order_placed";
pub const TP1_HIT: &str = "tp1_hit";
pub const TP2_HIT: &str = "tp2_hit";
pub const TP3_HIT: &str = "tp3_hit";
pub const SL_HIT: &str = "sl_hit";
pub const MANUAL_CLOSE: &str = "manual_close";
pub const ERROR: &str = "error";

// ─── TradeEvent ───────────────────────────────────────────────────────────────

/// One entry in a signal's lifecycle log.
///
/// `id` is assigned by the store under its write lock, so id order equals
/// insertion order — the tiebreak when timestamps collide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEvent {
    pub id: u64,
    pub signal_id: Uuid,
    pub event_type: String,
    /// Opaque payload from the execution agent — passed through untouched.
    pub event_data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Coarse status transition an event forces on its signal, if any.
///
/// This is the fixed mapping the store applies atomically with the append:
/// `order_placed → active`, terminal closes → `completed`, `error → failed`.
/// Every other event type leaves the stored status unchanged.
pub fn status_transition(event_type: &str) -> Option<SignalStatus> {
    match event_type {
        ORDER_PLACED => Some(SignalStatus::Active),
        TP3_HIT | SL_HIT | MANUAL_CLOSE => Some(SignalStatus::Completed),
        ERROR => Some(SignalStatus::Failed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_events_complete_the_signal() {
        assert_eq!(status_transition(TP3_HIT), Some(SignalStatus::Completed));
        assert_eq!(status_transition(SL_HIT), Some(SignalStatus::Completed));
        assert_eq!(status_transition(MANUAL_CLOSE), Some(SignalStatus::Completed));
    }

    #[test]
    fn partial_fills_leave_status_alone() {
        assert_eq!(status_transition(TP1_HIT), None);
        assert_eq!(status_transition(TP2_HIT), None);
        assert_eq!(status_transition("sl_moved"), None);
    }

    #[test]
    fn placement_and_error_transitions() {
        assert_eq!(status_transition(ORDER_PLACED), Some(SignalStatus::Active));
        assert_eq!(status_transition(ERROR), Some(SignalStatus::Failed));
    }
}
