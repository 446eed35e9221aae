//! # models
//!
//! Persisted entities: the [`Signal`] row and its append-only [`TradeEvent`]
//! log. Derived state lives in [`crate::reconcile`], never here.

pub mod event;
pub mod signal;

pub use event::{status_transition, TradeEvent};
pub use signal::{Side, Signal, SignalStatus};
