//! # reconcile
//!
//! Replays a signal's ordered trade-event log to compute its *current*
//! executable state: which targets are still live, where the stop sits now,
//! and the derived status.
//!
//! This is a pure fold over the event sequence — no I/O, no caching, always
//! re-derived from scratch. That property is what lets the execution agent
//! recover full position context after a restart using nothing but the
//! source-message id.
//!
//! Replay rules:
//! - `tp1_hit` → target 1 closed, stop moves to the original entry
//! - `tp2_hit` → target 2 closed, stop moves to target 1
//! - `tp3_hit` → target 3 closed, position fully closed
//! - everything else (including unknown event types) leaves state untouched

use serde::Serialize;

use crate::models::{event, Signal, SignalStatus, TradeEvent};

// ─── ReconciledState ──────────────────────────────────────────────────────────

/// Which target levels have been hit, plus the original levels — enough for
/// the execution agent to rebuild its bookkeeping verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecoveryState {
    pub tp1_hit: bool,
    pub tp2_hit: bool,
    pub tp3_hit: bool,
    pub original_sl: f64,
    pub original_tp1: f64,
    pub original_tp2: Option<f64>,
    pub original_tp3: Option<f64>,
}

/// Current executable parameters of a signal, derived from its event log.
///
/// Targets are `None` once hit; `stop_loss` is the *current* stop after any
/// trailing moves, not the stored one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledState {
    pub tp1: Option<f64>,
    pub tp2: Option<f64>,
    pub tp3: Option<f64>,
    pub stop_loss: f64,
    pub status: SignalStatus,
    pub recovery: RecoveryState,
}

// ─── Replay ───────────────────────────────────────────────────────────────────

/// Fold the ordered event log into the signal's current state.
///
/// Deterministic: the same `(signal, events)` input always yields the same
/// output. `events` must already be in replay order (timestamp ascending,
/// insertion-id tiebreak) — the store's read path guarantees that.
pub fn reconcile(signal: &Signal, events: &[TradeEvent]) -> ReconciledState {
    let mut tp1_hit = false;
    let mut tp2_hit = false;
    let mut tp3_hit = false;
    let mut stop_loss = signal.stop_loss;

    for e in events {
        match e.event_type.as_str() {
            event::TP1_HIT => {
                tp1_hit = true;
                stop_loss = signal.entry_price;
            }
            event::TP2_HIT => {
                tp2_hit = true;
                stop_loss = signal.tp1;
            }
            event::TP3_HIT => {
                // Full close — remaining levels stop mattering.
                tp3_hit = true;
            }
            _ => {}
        }
    }

    let status = if tp3_hit {
        SignalStatus::Completed
    } else if tp1_hit || tp2_hit {
        SignalStatus::ActivePartial
    } else {
        signal.status
    };

    ReconciledState {
        tp1: if tp1_hit { None } else { Some(signal.tp1) },
        tp2: if tp2_hit { None } else { signal.tp2 },
        tp3: if tp3_hit { None } else { signal.tp3 },
        stop_loss,
        status,
        recovery: RecoveryState {
            tp1_hit,
            tp2_hit,
            tp3_hit,
            original_sl: signal.stop_loss,
            original_tp1: signal.tp1,
            original_tp2: signal.tp2,
            original_tp3: signal.tp3,
        },
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
