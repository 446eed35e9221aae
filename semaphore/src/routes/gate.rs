//! # routes::gate
//!
//! The dispatch gate — the only write/read surface the listener agent and
//! the execution agent use:
//!
//! | Method | Path                            | Caller          |
//! |--------|---------------------------------|-----------------|
//! | POST   | `/add_signal`                   | listener agent  |
//! | GET    | `/get_pending_signals`          | execution agent |
//! | POST   | `/report_event`                 | execution agent |
//! | GET    | `/get_signal_state/:message_id` | execution agent |
//!
//! No state machine of its own: input validation and routing in front of the
//! store and the reconciler. Bodies are taken as raw JSON and validated
//! field by field so a missing `symbol` comes back as our 400 shape, not as
//! a framework rejection.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{Side, Signal, SignalStatus},
    reconcile::reconcile,
    state::SharedState,
    store::SignalRef,
};

// ─── Field helpers ────────────────────────────────────────────────────────────

fn require_str(body: &Value, field: &str) -> Result<String, AppError> {
    match body.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::Null) | None => {
            Err(AppError::BadRequest(format!("Missing required field: {field}")))
        }
        Some(_) => Err(AppError::BadRequest(format!("Field {field} must be a string"))),
    }
}

/// Numeric coercion: JSON numbers are accepted directly, numeric strings are
/// parsed — the upstream payloads are hand-assembled and sometimes quote
/// their numbers.
fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn require_f64(body: &Value, field: &str) -> Result<f64, AppError> {
    match body.get(field) {
        Some(Value::Null) | None => {
            Err(AppError::BadRequest(format!("Missing required field: {field}")))
        }
        Some(v) => coerce_f64(v)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid numeric value for {field}"))),
    }
}

fn require_i64(body: &Value, field: &str) -> Result<i64, AppError> {
    match body.get(field) {
        Some(Value::Null) | None => {
            Err(AppError::BadRequest(format!("Missing required field: {field}")))
        }
        Some(v) => coerce_i64(v)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid numeric value for {field}"))),
    }
}

fn optional_f64(body: &Value, field: &str) -> Result<Option<f64>, AppError> {
    match body.get(field) {
        Some(Value::Null) | None => Ok(None),
        Some(v) => coerce_f64(v)
            .map(Some)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid numeric value for {field}"))),
    }
}

// ─── POST /add_signal ─────────────────────────────────────────────────────────

/// Accept a new validated signal from the listener agent.
///
/// All validation happens before the store is touched; a duplicate
/// `message_id` returns 409, which the listener treats as success (retried
/// delivery is expected).
pub async fn add_signal(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let id: Uuid = require_str(&body, "id")?
        .parse()
        .map_err(|_| AppError::BadRequest("Field id must be a UUID".to_string()))?;

    let action_raw = require_str(&body, "action")?;
    let action = Side::parse(&action_raw).ok_or_else(|| {
        AppError::BadRequest(format!("Invalid action: must be BUY or SELL, got '{action_raw}'"))
    })?;

    let now = Utc::now();
    let signal = Signal {
        id,
        message_id: require_i64(&body, "message_id")?,
        channel_id: require_i64(&body, "channel_id")?,
        symbol: require_str(&body, "symbol")?,
        action,
        entry_price: require_f64(&body, "entry_price")?,
        stop_loss: require_f64(&body, "stop_loss")?,
        tp1: require_f64(&body, "tp1")?,
        tp2: optional_f64(&body, "tp2")?,
        tp3: optional_f64(&body, "tp3")?,
        raw_message: require_str(&body, "raw_message")?,
        status: SignalStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    let message_id = signal.message_id;
    let symbol = signal.symbol.clone();
    state.store.insert(signal).await?;

    info!(%id, message_id, %symbol, ?action, "✅ New signal accepted");

    Ok(Json(json!({
        "ok":         true,
        "status":     "success",
        "id":         id,
        "message_id": message_id,
    })))
}

// ─── GET /get_pending_signals ─────────────────────────────────────────────────

/// Signals awaiting initial execution, oldest first, max 10 — the execution
/// agent polls this.
pub async fn get_pending_signals(State(state): State<SharedState>) -> impl IntoResponse {
    let pending = state.store.list_pending().await;

    if !pending.is_empty() {
        info!(count = pending.len(), "Returned pending signals to execution agent");
    }

    let signals: Vec<Value> = pending
        .iter()
        .map(|s| {
            json!({
                "id":          s.id,
                "message_id":  s.message_id,
                "symbol":      s.symbol,
                "action":      s.action,
                "entry_price": s.entry_price,
                "stop_loss":   s.stop_loss,
                "tp1":         s.tp1,
                "tp2":         s.tp2,
                "tp3":         s.tp3,
            })
        })
        .collect();

    Json(json!({ "ok": true, "signals": signals }))
}

// ─── POST /report_event ───────────────────────────────────────────────────────

/// Record a lifecycle event reported by the execution agent.
///
/// The agent may reference the signal by its own id, by the source-message
/// id, or both; a stale signal id with a good message id still resolves.
pub async fn report_event(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let event_type = require_str(&body, "event_type")
        .map_err(|_| AppError::BadRequest("event_type is required".to_string()))?;

    // A malformed signal id is treated as stale, not as a 400 — the message
    // id fallback may still rescue the report.
    let signal_id_raw = body.get("signal_id").and_then(Value::as_str);
    let signal_id: Option<Uuid> = signal_id_raw.and_then(|s| s.parse().ok());
    let message_id = body.get("message_id").and_then(coerce_i64);

    if signal_id.is_none() && message_id.is_none() {
        if signal_id_raw.is_some() {
            return Err(AppError::NotFound(format!(
                "signal not found: {}",
                signal_id_raw.unwrap_or_default()
            )));
        }
        return Err(AppError::BadRequest(
            "signal_id or message_id is required".to_string(),
        ));
    }

    let event_data = body.get("event_data").cloned().unwrap_or_else(|| json!({}));

    let (resolved_id, new_status) = state
        .store
        .append_event(SignalRef { signal_id, message_id }, &event_type, event_data)
        .await?;

    info!(
        %event_type,
        signal_id = %resolved_id,
        new_status = ?new_status,
        "Event recorded"
    );

    Ok(Json(json!({
        "ok":         true,
        "status":     "success",
        "signal_id":  resolved_id,
        "new_status": new_status,
    })))
}

// ─── GET /get_signal_state/:message_id ────────────────────────────────────────

/// Current reconciled state of a signal, keyed by source-message id.
///
/// This is the recovery path: after a restart the execution agent calls this
/// with the only handle it kept (the message id) and gets back the current
/// stop, the remaining targets, the derived status and the full event list.
pub async fn get_signal_state(
    State(state): State<SharedState>,
    Path(message_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let (signal, events) = state
        .store
        .signal_with_events(message_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("no signal for message_id {message_id}")))?;

    let current = reconcile(&signal, &events);

    info!(
        message_id,
        symbol = %signal.symbol,
        status = ?current.status,
        stop_loss = current.stop_loss,
        "Returned reconciled signal state"
    );

    let events: Vec<Value> = events
        .iter()
        .map(|e| {
            json!({
                "event_type": e.event_type,
                "event_data": e.event_data,
                "timestamp":  e.timestamp,
            })
        })
        .collect();

    Ok(Json(json!({
        "ok":             true,
        "id":             signal.id,
        "message_id":     signal.message_id,
        "symbol":         signal.symbol,
        "action":         signal.action,
        "entry_price":    signal.entry_price,
        "stop_loss":      current.stop_loss,
        "tp1":            current.tp1,
        "tp2":            current.tp2,
        "tp3":            current.tp3,
        "status":         current.status,
        "recovery_state": current.recovery,
        "events":         events,
    })))
}
