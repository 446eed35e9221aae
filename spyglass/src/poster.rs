//! # poster — deliver extracted signals to semaphore
//!
//! A `409 Conflict` from semaphore means the signal is already stored
//! (redelivered message); the poster reports that as a successful outcome
//! so retries stay idempotent end to end.

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::message::InboundMessage;
use crate::order::ParsedOrder;

/// Body of `POST /add_signal`.
/// (Must match the fields semaphore's gate expects.)
#[derive(Debug, Serialize)]
pub struct SignalPayload {
    pub id:          Uuid,
    pub message_id:  i64,
    pub channel_id:  i64,
    pub symbol:      String,
    pub action:      &'static str,
    pub entry_price: f64,
    pub stop_loss:   f64,
    pub tp1:         f64,
    pub tp2:         Option<f64>,
    pub tp3:         Option<f64>,
    pub raw_message: String,
}

impl SignalPayload {
    pub fn from_order(order: ParsedOrder, msg: &InboundMessage) -> Self {
        Self {
            id:          Uuid::new_v4(),
            message_id:  msg.message_id,
            channel_id:  msg.channel_id,
            symbol:      order.pair,
            action:      order.side.as_str(),
            entry_price: order.entry_price,
            stop_loss:   order.stop_loss,
            tp1:         order.tp1,
            tp2:         order.tp2,
            tp3:         order.tp3,
            raw_message: order.raw_text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Accepted,
    /// Semaphore already holds this message_id.
    AlreadyKnown,
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("semaphore rejected signal: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("semaphore unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// POST one signal to `{relay_url}/add_signal`.
pub async fn post_signal(
    client: &reqwest::Client,
    config: &Config,
    payload: &SignalPayload,
) -> Result<DeliveryOutcome, DeliveryError> {
    let url = format!("{}/add_signal", config.relay_url);

    info!(
        signal_id  = %payload.id,
        message_id = payload.message_id,
        symbol     = %payload.symbol,
        action     = payload.action,
        url        = %url,
        "Posting signal to semaphore..."
    );

    let resp = client
        .post(&url)
        .json(payload)
        .timeout(std::time::Duration::from_secs(5))
        .send()
        .await?;

    let status = resp.status();
    if status == reqwest::StatusCode::CONFLICT {
        info!(message_id = payload.message_id, "Signal already known to semaphore — redelivery");
        return Ok(DeliveryOutcome::AlreadyKnown);
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(DeliveryError::Rejected { status: status.as_u16(), body });
    }

    let body: serde_json::Value = resp.json().await.unwrap_or_default();
    debug!(response = %body, "Signal accepted by semaphore ✅");

    Ok(DeliveryOutcome::Accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Side;

    #[test]
    fn payload_carries_message_identity_and_levels() {
        let order = ParsedOrder {
            pair: "GBPJPY".to_string(),
            side: Side::Sell,
            entry_price: 199.231,
            stop_loss: 199.558,
            tp1: 198.736,
            tp2: None,
            tp3: None,
            raw_text: "🔴 GBPJPY ...".to_string(),
        };
        let msg = InboundMessage {
            message_id: 77,
            channel_id: -100123,
            text: String::new(),
            is_reply: false,
        };

        let payload = SignalPayload::from_order(order, &msg);
        assert_eq!(payload.message_id, 77);
        assert_eq!(payload.channel_id, -100123);
        assert_eq!(payload.action, "SELL");

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["symbol"], "GBPJPY");
        assert_eq!(json["tp2"], serde_json::Value::Null);
    }
}
