//! # prompt — extraction prompt for the AI strategy
//!
//! The AI must answer with a JSON object spyglass can parse directly;
//! worked examples pin down the formats channels actually use.

/// Build the extraction prompt for one message.
pub fn build_prompt(text: &str) -> String {
    format!(
        r##"You are a precise trading-signal parser. Analyze the following channel message and decide whether it is a NEW limit-order signal.

## Message
{text}

## Your Task
Extract the structured order if (and only if) this is a new limit-order signal.

**CRITICAL**: Respond with ONLY a valid JSON object. No explanations, no markdown, no code fences.

## Required JSON Format
```
{{
  "is_valid_signal": true | false,
  "pair": "<6-letter instrument, e.g. EURUSD>",
  "action": "BUY" | "SELL",
  "entry_price": <float>,
  "stop_loss": <float>,
  "tp1": <float>,
  "tp2": <float or null>,
  "tp3": <float or null>
}}
```

## Rules
1. Set is_valid_signal to false for replies, updates ("TP1 hit", "move SL", "close half"), market orders, and general chatter. When false, all other fields may be null.
2. A green circle marker means BUY, a red circle marker means SELL. Otherwise ignore emojis.
3. Take-profit levels may be numbered (TP1/TP2/TP3, "Target Profit 1") or a single unnumbered "Take-profit". Omit levels the message does not state (null, never 0).
4. Prices are plain decimals; never invent a price that is not in the message.

## Examples
Message: "Placed a limit order on (red circle) GBPJPY / Entry: 199.231 / Take-profit: 198.736 / Stop-loss: 199.558"
Answer: {{"is_valid_signal": true, "pair": "GBPJPY", "action": "SELL", "entry_price": 199.231, "stop_loss": 199.558, "tp1": 198.736, "tp2": null, "tp3": null}}

Message: "BUY LIMIT EURUSD @ 1.0850 / SL: 1.0800 / TP1: 1.0900 / TP2: 1.0950"
Answer: {{"is_valid_signal": true, "pair": "EURUSD", "action": "BUY", "entry_price": 1.0850, "stop_loss": 1.0800, "tp1": 1.0900, "tp2": 1.0950, "tp3": null}}

Message: "#signals EURUSD Buy Limit Order: 1.16050 Target Profit 1: 1.16350 Target Profit 2: 1.16650 Stop Loss: 1.15750"
Answer: {{"is_valid_signal": true, "pair": "EURUSD", "action": "BUY", "entry_price": 1.16050, "stop_loss": 1.15750, "tp1": 1.16350, "tp2": 1.16650, "tp3": null}}

Message: "TP1 hit, move SL to entry"
Answer: {{"is_valid_signal": false, "pair": null, "action": null, "entry_price": null, "stop_loss": null, "tp1": null, "tp2": null, "tp3": null}}

Respond with JSON only:"##
    )
}
