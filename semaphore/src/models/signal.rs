//! # models::signal
//!
//! Defines [`Signal`] — an accepted, validated limit-order instruction
//! derived from a channel message. Created exactly once per source message
//! by the listener agent, never deleted, only status-mutated as the
//! execution agent reports events back.
//!
//! Keeping this object flat and `Clone`-able ensures the store's `RwLock`
//! guards are held for the absolute minimum time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Side ─────────────────────────────────────────────────────────────────────

/// Order side of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Parse the wire form (`"BUY"` / `"SELL"`), case-sensitive like the
    /// payload contract.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BUY" => Some(Side::Buy),
            "SELL" => Some(Side::Sell),
            _ => None,
        }
    }
}

// ─── SignalStatus ─────────────────────────────────────────────────────────────

/// Coarse lifecycle status of a signal.
///
/// The store only ever writes `Pending`, `Active`, `Completed` and `Failed`.
/// `ActivePartial` is **derived** during reconciliation (some targets hit,
/// position still open) and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    /// Accepted, waiting for the execution agent to pick it up.
    Pending,
    /// The execution agent placed the order.
    Active,
    /// Derived only: at least one target hit, position not fully closed.
    ActivePartial,
    /// Position fully closed (tp3 / stop / manual close).
    Completed,
    /// The execution agent reported an error for this signal.
    Failed,
}

// ─── Signal ───────────────────────────────────────────────────────────────────

/// A persisted signal row.
///
/// `id` is client-generated at extraction time; `message_id` is the natural
/// dedup key — the store enforces uniqueness on it so redelivered messages
/// collapse into one row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: Uuid,
    /// Source-message identifier from the channel transport.
    pub message_id: i64,
    pub channel_id: i64,
    /// 6-letter instrument code, e.g. `"EURUSD"`.
    pub symbol: String,
    pub action: Side,
    pub entry_price: f64,
    pub stop_loss: f64,
    /// First take-profit — always present.
    pub tp1: f64,
    pub tp2: Option<f64>,
    pub tp3: Option<f64>,
    /// Originating message text, retained for audit.
    pub raw_message: String,
    pub status: SignalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
