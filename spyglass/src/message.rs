//! # message — inbound channel messages
//!
//! Spyglass reads messages as NDJSON on stdin, one [`InboundMessage`] per
//! line, so any channel bridge (Telegram, Discord, a replay file) can feed
//! it without the agent knowing the transport.

use serde::Deserialize;

/// One raw message from a monitored channel.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    /// Channel-scoped message id, used downstream for idempotent delivery.
    pub message_id: i64,
    pub channel_id: i64,
    #[serde(default)]
    pub text:       String,
    /// Set by the bridge when this message replies to an earlier one.
    #[serde(default)]
    pub is_reply:   bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_a_bridge_line() {
        let line = r#"{"message_id": 42, "channel_id": -1001234567890, "text": "BUY LIMIT EURUSD @ 1.0850"}"#;
        let msg: InboundMessage = serde_json::from_str(line).unwrap();
        assert_eq!(msg.message_id, 42);
        assert_eq!(msg.channel_id, -1001234567890);
        assert!(!msg.is_reply);
    }

    #[test]
    fn missing_text_defaults_to_empty() {
        let line = r#"{"message_id": 1, "channel_id": 2, "is_reply": true}"#;
        let msg: InboundMessage = serde_json::from_str(line).unwrap();
        assert!(msg.text.is_empty());
        assert!(msg.is_reply);
    }
}
