//! # order
//!
//! Defines [`ParsedOrder`] — the structured limit-order instruction an
//! extraction strategy produces from raw message text — and its price-level
//! validation.
//!
//! Validation is deliberately a pure predicate with no side effects beyond
//! diagnostics, so it can be exercised independently of any extraction
//! strategy (see `tests/validation_props.rs`).

use serde::{Deserialize, Serialize};
use tracing::debug;

// ─── Side ─────────────────────────────────────────────────────────────────────

/// Order side of an extracted signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

// ─── ParsedOrder ──────────────────────────────────────────────────────────────

/// A structured limit-order instruction extracted from message text.
///
/// Supports 1–3 take-profit levels: `tp1` is required, `tp2`/`tp3` are
/// optional and trailing — a hole in the middle (`tp3` without `tp2`) is a
/// malformed order, never a valid representation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOrder {
    /// 6-letter instrument code, e.g. `"EURUSD"`.
    pub pair: String,
    pub side: Side,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub tp1: f64,
    pub tp2: Option<f64>,
    pub tp3: Option<f64>,
    /// Originating message text, retained for audit.
    pub raw_text: String,
}

impl ParsedOrder {
    /// All present take-profit levels in order.
    pub fn take_profits(&self) -> Vec<f64> {
        let mut tps = vec![self.tp1];
        if let Some(tp2) = self.tp2 {
            tps.push(tp2);
        }
        if let Some(tp3) = self.tp3 {
            tps.push(tp3);
        }
        tps
    }

    /// Side-dependent price-ordering invariant, strict over present targets:
    ///
    /// - BUY:  `stop < entry < tp1 < tp2 < tp3`
    /// - SELL: `tp3 < tp2 < tp1 < entry < stop`
    ///
    /// Also rejects empty pairs, non-positive prices and a `tp3` without a
    /// `tp2` (targets are trailing-optional, never null-padded mid-sequence).
    pub fn is_valid(&self) -> bool {
        if self.pair.is_empty() {
            debug!("validation failed: empty pair");
            return false;
        }

        let prices = [Some(self.entry_price), Some(self.stop_loss), Some(self.tp1), self.tp2, self.tp3];
        if prices.iter().flatten().any(|p| !p.is_finite() || *p <= 0.0) {
            debug!(pair = %self.pair, "validation failed: non-positive price level");
            return false;
        }

        if self.tp3.is_some() && self.tp2.is_none() {
            debug!(pair = %self.pair, "validation failed: tp3 present without tp2");
            return false;
        }

        let tps = self.take_profits();
        match self.side {
            Side::Buy => {
                if !(self.stop_loss < self.entry_price && self.entry_price < self.tp1) {
                    debug!(
                        pair = %self.pair,
                        sl = self.stop_loss,
                        entry = self.entry_price,
                        tp1 = self.tp1,
                        "BUY validation failed: want SL < Entry < TP1"
                    );
                    return false;
                }
                if !tps.windows(2).all(|w| w[0] < w[1]) {
                    debug!(pair = %self.pair, "BUY validation failed: targets not strictly ascending");
                    return false;
                }
            }
            Side::Sell => {
                if !(self.tp1 < self.entry_price && self.entry_price < self.stop_loss) {
                    debug!(
                        pair = %self.pair,
                        tp1 = self.tp1,
                        entry = self.entry_price,
                        sl = self.stop_loss,
                        "SELL validation failed: want TP1 < Entry < SL"
                    );
                    return false;
                }
                if !tps.windows(2).all(|w| w[0] > w[1]) {
                    debug!(pair = %self.pair, "SELL validation failed: targets not strictly descending");
                    return false;
                }
            }
        }

        true
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
