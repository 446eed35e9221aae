//! # store
//!
//! In-memory signal table + append-only trade-event log behind a single
//! `RwLock`. The lock is the atomicity boundary:
//!
//! - `insert` checks-and-writes the message-id uniqueness constraint under
//!   one write guard, so concurrent inserts of the same message id produce
//!   exactly one success and one [`StoreError::Duplicate`].
//! - `append_event` writes the event *and* the resulting status transition
//!   under the same guard — no reader can observe one without the other.
//! - `signal_with_events` reads a signal and its full event log in one read
//!   guard, giving the reconciler a consistent snapshot.
//!
//! Guards are never held across `.await` points or network calls.

use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{status_transition, Signal, SignalStatus, TradeEvent};

/// Page size for the poll-based dispatch read path.
pub const PENDING_PAGE_SIZE: usize = 10;

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A signal with this source-message id already exists.
    #[error("signal already exists for message_id {0}")]
    Duplicate(i64),

    /// A signal with this id already exists.
    #[error("signal already exists for id {0}")]
    DuplicateId(Uuid),

    /// Neither the signal id nor the message id resolved.
    #[error("signal not found: {0}")]
    NotFound(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) | StoreError::DuplicateId(_) => {
                AppError::Duplicate(err.to_string())
            }
            StoreError::NotFound(_) => AppError::NotFound(err.to_string()),
        }
    }
}

// ─── SignalRef ────────────────────────────────────────────────────────────────

/// Dual-key reference used by the execution agent when reporting events.
///
/// Resolution tries the signal's own id first, then falls back to the
/// source-message id — the agent may only know the message id (it doubles as
/// its order magic number), or may hold a stale signal id after a restart.
#[derive(Debug, Clone, Copy)]
pub struct SignalRef {
    pub signal_id: Option<Uuid>,
    pub message_id: Option<i64>,
}

// ─── Stats ────────────────────────────────────────────────────────────────────

/// Aggregate counters for the `/stats` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    pub total_signals: usize,
    pub pending_signals: usize,
    pub active_signals: usize,
    pub completed_signals: usize,
    pub failed_signals: usize,
    pub total_events: usize,
}

// ─── SignalStore ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct StoreInner {
    signals: HashMap<Uuid, Signal>,
    /// Uniqueness index: source-message id → signal id.
    by_message: HashMap<i64, Uuid>,
    /// Append-only; insertion order is timestamp order with id tiebreak.
    events: Vec<TradeEvent>,
    next_event_id: u64,
}

/// Durable table of accepted signals plus their lifecycle event log.
///
/// "Durable" at the interface level: rows are never deleted, only
/// status-mutated. The backing storage engine is deliberately swappable
/// behind this method surface.
#[derive(Default)]
pub struct SignalStore {
    inner: RwLock<StoreInner>,
}

impl SignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new signal. Fails with [`StoreError::Duplicate`] when a
    /// signal with the same `message_id` already exists — redelivery is
    /// expected, so callers treat that as idempotent success.
    ///
    /// The signal id is unique too: rows are never replaced, so a reused id
    /// (even under a fresh `message_id`) is rejected the same way.
    pub async fn insert(&self, signal: Signal) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        if inner.by_message.contains_key(&signal.message_id) {
            return Err(StoreError::Duplicate(signal.message_id));
        }
        if inner.signals.contains_key(&signal.id) {
            return Err(StoreError::DuplicateId(signal.id));
        }

        inner.by_message.insert(signal.message_id, signal.id);
        inner.signals.insert(signal.id, signal);
        Ok(())
    }

    /// Append a lifecycle event and apply its coarse status transition as
    /// one atomic unit. Returns the resolved signal id and the new status,
    /// if the event forced one.
    pub async fn append_event(
        &self,
        signal_ref: SignalRef,
        event_type: &str,
        event_data: serde_json::Value,
    ) -> Result<(Uuid, Option<SignalStatus>), StoreError> {
        let mut inner = self.inner.write().await;

        let signal_id = resolve(&inner, signal_ref)?;

        let id = inner.next_event_id;
        inner.next_event_id += 1;
        inner.events.push(TradeEvent {
            id,
            signal_id,
            event_type: event_type.to_string(),
            event_data,
            timestamp: Utc::now(),
        });

        let new_status = status_transition(event_type);
        if let Some(status) = new_status {
            // Resolution succeeded above, the entry must exist.
            if let Some(signal) = inner.signals.get_mut(&signal_id) {
                signal.status = status;
                signal.updated_at = Utc::now();
            }
        }

        Ok((signal_id, new_status))
    }

    /// Signals awaiting initial execution: status = pending, oldest first,
    /// bounded to [`PENDING_PAGE_SIZE`].
    pub async fn list_pending(&self) -> Vec<Signal> {
        let inner = self.inner.read().await;

        let mut pending: Vec<Signal> = inner
            .signals
            .values()
            .filter(|s| s.status == SignalStatus::Pending)
            .cloned()
            .collect();

        // message_id tiebreak keeps the page deterministic when timestamps
        // collide.
        pending.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.message_id.cmp(&b.message_id))
        });
        pending.truncate(PENDING_PAGE_SIZE);
        pending
    }

    /// Consistent snapshot of a signal and its full ordered event log, keyed
    /// by source-message id. This is the reconciler's read path.
    pub async fn signal_with_events(&self, message_id: i64) -> Option<(Signal, Vec<TradeEvent>)> {
        let inner = self.inner.read().await;

        let signal_id = *inner.by_message.get(&message_id)?;
        let signal = inner.signals.get(&signal_id)?.clone();

        let mut events: Vec<TradeEvent> = inner
            .events
            .iter()
            .filter(|e| e.signal_id == signal_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));

        Some((signal, events))
    }

    /// Aggregate counts by status plus total event count.
    pub async fn stats(&self) -> StoreStats {
        let inner = self.inner.read().await;

        let mut stats = StoreStats {
            total_signals: inner.signals.len(),
            pending_signals: 0,
            active_signals: 0,
            completed_signals: 0,
            failed_signals: 0,
            total_events: inner.events.len(),
        };

        for signal in inner.signals.values() {
            match signal.status {
                SignalStatus::Pending => stats.pending_signals += 1,
                SignalStatus::Active | SignalStatus::ActivePartial => {
                    stats.active_signals += 1
                }
                SignalStatus::Completed => stats.completed_signals += 1,
                SignalStatus::Failed => stats.failed_signals += 1,
            }
        }
        stats
    }
}

/// Two-step lookup: signal id first, then message id. Explicit rather than
/// overloaded so the fallback is visible at the call site.
fn resolve(inner: &StoreInner, signal_ref: SignalRef) -> Result<Uuid, StoreError> {
    if let Some(id) = signal_ref.signal_id {
        if inner.signals.contains_key(&id) {
            return Ok(id);
        }
        // Stale or wrong signal id — fall back to the message id when the
        // caller supplied one.
        if let Some(message_id) = signal_ref.message_id {
            if let Some(&resolved) = inner.by_message.get(&message_id) {
                tracing::info!(
                    given = %id,
                    resolved = %resolved,
                    message_id,
                    "signal id unknown, resolved via message_id fallback"
                );
                return Ok(resolved);
            }
        }
        return Err(StoreError::NotFound(format!("signal_id {id}")));
    }

    if let Some(message_id) = signal_ref.message_id {
        if let Some(&resolved) = inner.by_message.get(&message_id) {
            return Ok(resolved);
        }
        return Err(StoreError::NotFound(format!("message_id {message_id}")));
    }

    Err(StoreError::NotFound("no signal reference given".to_string()))
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::{event, Side};

    fn make_signal(message_id: i64) -> Signal {
        let now = Utc::now();
        Signal {
            id: Uuid::new_v4(),
            message_id,
            channel_id: -1001234567890,
            symbol: "EURUSD".to_string(),
            action: Side::Buy,
            entry_price: 1.0850,
            stop_loss: 1.0800,
            tp1: 1.0900,
            tp2: Some(1.0950),
            tp3: Some(1.1000),
            raw_message: "BUY LIMIT EURUSD @ 1.0850".to_string(),
            status: SignalStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn insert_is_idempotent_on_message_id() {
        let store = SignalStore::new();
        store.insert(make_signal(42)).await.unwrap();

        let second = store.insert(make_signal(42)).await;
        assert_eq!(second, Err(StoreError::Duplicate(42)));

        // Exactly one row survives.
        let stats = store.stats().await;
        assert_eq!(stats.total_signals, 1);
    }

    #[tokio::test]
    async fn reused_signal_id_never_replaces_a_row() {
        let store = SignalStore::new();
        let first = make_signal(1);
        let id = first.id;
        store.insert(first).await.unwrap();

        // Same id, fresh message_id — must not overwrite the existing row.
        let mut second = make_signal(2);
        second.id = id;
        let err = store.insert(second).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateId(id));

        let stats = store.stats().await;
        assert_eq!(stats.total_signals, 1);
        let (survivor, _) = store.signal_with_events(1).await.unwrap();
        assert_eq!(survivor.message_id, 1);
        assert!(store.signal_with_events(2).await.is_none());
    }

    #[tokio::test]
    async fn concurrent_same_id_inserts_yield_one_success() {
        let store = Arc::new(SignalStore::new());

        let a = tokio::spawn({
            let store = store.clone();
            async move { store.insert(make_signal(7)).await }
        });
        let b = tokio::spawn({
            let store = store.clone();
            async move { store.insert(make_signal(7)).await }
        });

        let (ra, rb) = (a.await.unwrap(), b.await.unwrap());
        assert!(ra.is_ok() != rb.is_ok(), "exactly one insert must win");
        assert_eq!(store.stats().await.total_signals, 1);
    }

    #[tokio::test]
    async fn append_event_resolves_by_message_id() {
        let store = SignalStore::new();
        let signal = make_signal(42);
        let signal_id = signal.id;
        store.insert(signal).await.unwrap();

        let (resolved, status) = store
            .append_event(
                SignalRef { signal_id: None, message_id: Some(42) },
                event::ORDER_PLACED,
                serde_json::json!({}),
            )
            .await
            .unwrap();

        assert_eq!(resolved, signal_id);
        assert_eq!(status, Some(SignalStatus::Active));

        let (signal, events) = store.signal_with_events(42).await.unwrap();
        assert_eq!(signal.status, SignalStatus::Active);
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn append_event_falls_back_when_signal_id_is_stale() {
        let store = SignalStore::new();
        let signal = make_signal(42);
        let real_id = signal.id;
        store.insert(signal).await.unwrap();

        // Wrong signal id, good message id → fallback resolves.
        let (resolved, _) = store
            .append_event(
                SignalRef { signal_id: Some(Uuid::new_v4()), message_id: Some(42) },
                event::TP1_HIT,
                serde_json::json!({}),
            )
            .await
            .unwrap();
        assert_eq!(resolved, real_id);

        // Wrong signal id, no message id → not found.
        let err = store
            .append_event(
                SignalRef { signal_id: Some(Uuid::new_v4()), message_id: None },
                event::TP1_HIT,
                serde_json::json!({}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn unknown_event_types_append_but_keep_status() {
        let store = SignalStore::new();
        store.insert(make_signal(42)).await.unwrap();

        let (_, status) = store
            .append_event(
                SignalRef { signal_id: None, message_id: Some(42) },
                "sl_moved",
                serde_json::json!({"to": 1.0850}),
            )
            .await
            .unwrap();
        assert_eq!(status, None);

        let (signal, events) = store.signal_with_events(42).await.unwrap();
        assert_eq!(signal.status, SignalStatus::Pending);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "sl_moved");
    }

    #[tokio::test]
    async fn list_pending_is_oldest_first_and_bounded() {
        let store = SignalStore::new();
        for i in 0..15 {
            let mut signal = make_signal(100 + i);
            signal.created_at = Utc::now() + chrono::Duration::milliseconds(i);
            store.insert(signal).await.unwrap();
        }

        // One placed order drops out of the pending page.
        store
            .append_event(
                SignalRef { signal_id: None, message_id: Some(100) },
                event::ORDER_PLACED,
                serde_json::json!({}),
            )
            .await
            .unwrap();

        let page = store.list_pending().await;
        assert_eq!(page.len(), PENDING_PAGE_SIZE);
        assert_eq!(page[0].message_id, 101);
        for pair in page.windows(2) {
            assert!(pair[0].created_at <= pair[1].created_at);
        }
    }

    #[tokio::test]
    async fn stats_count_by_status_and_events() {
        let store = SignalStore::new();
        store.insert(make_signal(1)).await.unwrap();
        store.insert(make_signal(2)).await.unwrap();
        store.insert(make_signal(3)).await.unwrap();

        let by_msg = |id| SignalRef { signal_id: None, message_id: Some(id) };
        store
            .append_event(by_msg(1), event::ORDER_PLACED, serde_json::json!({}))
            .await
            .unwrap();
        store
            .append_event(by_msg(2), event::SL_HIT, serde_json::json!({}))
            .await
            .unwrap();

        let stats = store.stats().await;
        assert_eq!(stats.total_signals, 3);
        assert_eq!(stats.pending_signals, 1);
        assert_eq!(stats.active_signals, 1);
        assert_eq!(stats.completed_signals, 1);
        assert_eq!(stats.failed_signals, 0);
        assert_eq!(stats.total_events, 2);
    }
}
