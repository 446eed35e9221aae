//! # extract — strategy chain
//!
//! An [`Extractor`] runs an ordered list of [`ExtractStrategy`]s over a
//! message. The first strategy that produces an order settles the matter:
//! if its order fails price validation the message is dropped, later
//! strategies are *not* consulted. Fallback happens only when a strategy
//! declines to produce anything (returns `None`).
//!
//! That asymmetry is deliberate: a strategy confident enough to emit
//! prices that then contradict each other is describing a broken signal,
//! and a second opinion on broken prices just launders them.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::message::InboundMessage;
use crate::order::ParsedOrder;

/// One way of turning message text into a structured order.
#[async_trait]
pub trait ExtractStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Some(order)` — this strategy recognized a signal (not yet
    /// price-validated). `None` — pass to the next strategy.
    async fn try_extract(&self, text: &str) -> Option<ParsedOrder>;
}

/// Why a message produced no order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseReason {
    /// The bridge flagged it as a reply to an earlier message.
    Reply,
    /// No strategy recognized a signal.
    NoMatch,
    /// A strategy produced an order whose prices failed validation.
    InvalidPrices { strategy: &'static str },
}

/// Outcome of running the strategy chain over one message.
#[derive(Debug)]
pub enum Extraction {
    Order(ParsedOrder),
    Noise(NoiseReason),
}

pub struct Extractor {
    strategies: Vec<Box<dyn ExtractStrategy>>,
}

impl Extractor {
    pub fn new(strategies: Vec<Box<dyn ExtractStrategy>>) -> Self {
        Self { strategies }
    }

    pub async fn classify(&self, msg: &InboundMessage) -> Extraction {
        if msg.is_reply {
            debug!(message_id = msg.message_id, "skipping reply message");
            return Extraction::Noise(NoiseReason::Reply);
        }

        for strategy in &self.strategies {
            let Some(order) = strategy.try_extract(&msg.text).await else {
                continue;
            };

            if !order.is_valid() {
                warn!(
                    message_id = msg.message_id,
                    strategy = strategy.name(),
                    pair = %order.pair,
                    "extracted order failed price validation — dropping message"
                );
                return Extraction::Noise(NoiseReason::InvalidPrices {
                    strategy: strategy.name(),
                });
            }

            info!(
                message_id = msg.message_id,
                strategy = strategy.name(),
                pair = %order.pair,
                action = order.side.as_str(),
                "signal extracted"
            );
            return Extraction::Order(order);
        }

        Extraction::Noise(NoiseReason::NoMatch)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
