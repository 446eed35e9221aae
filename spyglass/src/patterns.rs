//! # patterns
//!
//! Pattern-based extraction: a hand-written token scanner that first
//! pre-filters a message (is this a *new* limit-order signal at all?) and
//! then pulls out pair, side, entry, stop and 1–3 take-profit levels.
//!
//! The pre-filter requires **all** of:
//! - an explicit `<SIDE> LIMIT [ORDER]` phrase, or a colored-circle marker
//!   (🟢 = BUY, 🔴 = SELL)
//! - no reply/follow-up vocabulary (`close`, `hit`, `move`, `partial`,
//!   stand-alone `profit`, `sl`/`tp` + `hit`/`move`/`to`)
//! - a standalone 6-uppercase-letter instrument token
//! - an entry-price token and a stop-loss token
//! - at least one take-profit token
//!
//! Extraction rules: side markers beat text phrases when both are present;
//! numbered targets (`TP1`–`TP3`) make any unnumbered take-profit token
//! ignored entirely.

use std::collections::HashSet;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::extract::ExtractStrategy;
use crate::order::{ParsedOrder, Side};

const BUY_MARKER: char = '🟢';
const SELL_MARKER: char = '🔴';

/// Words that mark a message as a follow-up to an earlier signal rather
/// than a new order.
static REPLY_WORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["close", "hit", "move", "partial"].into_iter().collect());

/// Single-word entry-price labels; `limit order` works through `order`.
static ENTRY_LABELS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["entry", "price", "order"].into_iter().collect());

// ─── Tokenizer ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Word<'a> {
    text: &'a str,
    end: usize,
}

/// Split into word tokens (ASCII alphanumeric + underscore runs) with byte
/// positions. Emoji and punctuation act as boundaries.
fn words(text: &str) -> Vec<Word<'_>> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if c.is_ascii_alphanumeric() || c == '_' {
            start.get_or_insert(i);
        } else if let Some(s) = start.take() {
            out.push(Word { text: &text[s..i], end: i });
        }
    }
    if let Some(s) = start {
        out.push(Word { text: &text[s..], end: text.len() });
    }
    out
}

/// Parse a price immediately following a label: skip `[\s:@]`, then read
/// `digits[.digits]`.
fn number_after(text: &str, from: usize) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut i = from;

    while i < bytes.len() && matches!(bytes[i], b' ' | b'\t' | b'\r' | b'\n' | b':' | b'@') {
        i += 1;
    }
    let start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == start {
        return None;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }

    text[start..i].parse().ok()
}

// ─── Field scanners ───────────────────────────────────────────────────────────

/// First standalone 6-uppercase-letter token, e.g. `EURUSD`. Works on the
/// original (un-lowercased) text.
fn find_pair(text: &str) -> Option<String> {
    words(text)
        .into_iter()
        .find(|w| w.text.len() == 6 && w.text.bytes().all(|b| b.is_ascii_uppercase()))
        .map(|w| w.text.to_string())
}

/// Explicit side phrase: `buy limit` / `sell limit`.
fn find_side_phrase(tokens: &[Word<'_>]) -> Option<Side> {
    for pair in tokens.windows(2) {
        if pair[1].text == "limit" {
            match pair[0].text {
                "buy" => return Some(Side::Buy),
                "sell" => return Some(Side::Sell),
                _ => {}
            }
        }
    }
    None
}

/// A bare `limit order` phrase — satisfies the pre-filter without carrying
/// a side of its own.
fn has_limit_order_phrase(tokens: &[Word<'_>]) -> bool {
    tokens
        .windows(2)
        .any(|p| p[0].text == "limit" && p[1].text == "order")
}

/// Reply/follow-up vocabulary check. `profit` only counts when it is *not*
/// part of `take profit` / `take-profit`.
fn has_reply_vocabulary(tokens: &[Word<'_>]) -> bool {
    for (i, w) in tokens.iter().enumerate() {
        if REPLY_WORDS.contains(w.text) {
            return true;
        }
        // Only "take profit" / "take-profit" exempts the word; anything else
        // ("took profit", "profit secured", "Target Profit") reads as a
        // follow-up here and is left to the AI strategy.
        if w.text == "profit" && tokens.get(i.wrapping_sub(1)).map(|p| p.text) != Some("take") {
            return true;
        }
        if matches!(w.text, "sl" | "tp") {
            if let Some(next) = tokens.get(i + 1) {
                if matches!(next.text, "hit" | "move" | "to") {
                    return true;
                }
            }
        }
    }
    false
}

/// Leftmost entry price: a labeled value (`entry`/`price`/`order`/
/// `limit order`) or a bare `@ <price>`.
fn find_entry(lower: &str, tokens: &[Word<'_>]) -> Option<f64> {
    let mut candidates: Vec<usize> = tokens
        .iter()
        .filter(|w| ENTRY_LABELS.contains(w.text))
        .map(|w| w.end)
        .collect();
    candidates.extend(lower.bytes().enumerate().filter(|(_, b)| *b == b'@').map(|(i, _)| i + 1));
    candidates.sort_unstable();

    candidates.into_iter().find_map(|pos| number_after(lower, pos))
}

/// Stop-loss price: `sl` / `stop loss` / `stop-loss` label.
fn find_stop(lower: &str, tokens: &[Word<'_>]) -> Option<f64> {
    for (i, w) in tokens.iter().enumerate() {
        let label_end = match w.text {
            "sl" => Some(w.end),
            "stop" => tokens
                .get(i + 1)
                .filter(|next| next.text == "loss")
                .map(|next| next.end),
            _ => None,
        };
        if let Some(end) = label_end {
            if let Some(price) = number_after(lower, end) {
                return Some(price);
            }
        }
    }
    None
}

#[derive(Debug, Default, PartialEq)]
struct Targets {
    tp1: Option<f64>,
    tp2: Option<f64>,
    tp3: Option<f64>,
    /// A numbered target parsed successfully — numbered targets disable the
    /// unnumbered pattern entirely.
    numbered: bool,
}

impl Targets {
    fn any(&self) -> bool {
        self.tp1.is_some() || self.tp2.is_some() || self.tp3.is_some()
    }

    fn set(&mut self, level: u8, price: f64) {
        match level {
            1 => self.tp1 = Some(price),
            2 => self.tp2 = Some(price),
            3 => self.tp3 = Some(price),
            _ => {}
        }
    }
}

fn level_of(token: &str) -> Option<u8> {
    match token {
        "1" => Some(1),
        "2" => Some(2),
        "3" => Some(3),
        _ => None,
    }
}

/// Take-profit levels. Numbered forms: `tp1`, `tp 1`, `take profit 1`,
/// `target profit 1`. Unnumbered forms: `take profit` / `take-profit` /
/// `target profit` — used only when no numbered token exists.
fn find_targets(lower: &str, tokens: &[Word<'_>]) -> Targets {
    let mut targets = Targets::default();
    let mut simple: Option<f64> = None;

    for (i, w) in tokens.iter().enumerate() {
        // Glued form: tp1 / tp2 / tp3
        if w.text.len() == 3 && &w.text[..2] == "tp" {
            if let Some(level) = level_of(&w.text[2..]) {
                if let Some(price) = number_after(lower, w.end) {
                    targets.numbered = true;
                    targets.set(level, price);
                }
                continue;
            }
        }
        // Split form: tp 1
        if w.text == "tp" {
            if let Some(next) = tokens.get(i + 1) {
                if let Some(level) = level_of(next.text) {
                    if let Some(price) = number_after(lower, next.end) {
                        targets.numbered = true;
                        targets.set(level, price);
                    }
                    continue;
                }
            }
        }
        // take profit [1-3] / target profit [1-3]
        if matches!(w.text, "take" | "target") {
            let Some(profit) = tokens.get(i + 1).filter(|n| n.text == "profit") else {
                continue;
            };
            let mut handled = false;
            if let Some(level) = tokens.get(i + 2).and_then(|n| level_of(n.text)) {
                if let Some(price) = number_after(lower, tokens[i + 2].end) {
                    targets.numbered = true;
                    targets.set(level, price);
                    handled = true;
                }
            }
            // The level digit can be the integer part of the price itself
            // ("Take profit: 1.0900"), so a failed numbered parse falls back
            // to the unnumbered label.
            if !handled && simple.is_none() {
                simple = number_after(lower, profit.end);
            }
        }
    }

    if !targets.numbered {
        targets.tp1 = simple;
    }
    targets
}

// ─── Pre-filter ───────────────────────────────────────────────────────────────

/// Does this text look like a *new* limit-order signal? All conditions must
/// hold; any miss classifies the message as noise without running
/// extraction.
pub fn is_new_signal(text: &str) -> bool {
    let lower = text.to_lowercase();
    let tokens = words(&lower);

    let has_marker = text.contains(BUY_MARKER) || text.contains(SELL_MARKER);
    let has_phrase = find_side_phrase(&tokens).is_some() || has_limit_order_phrase(&tokens);
    if !(has_marker || has_phrase) {
        debug!("pre-filter: no limit-order phrase or side marker");
        return false;
    }

    if has_reply_vocabulary(&tokens) {
        debug!("pre-filter: reply vocabulary present");
        return false;
    }

    if find_pair(text).is_none() {
        debug!("pre-filter: no instrument token");
        return false;
    }

    if find_entry(&lower, &tokens).is_none() || find_stop(&lower, &tokens).is_none() {
        debug!("pre-filter: entry or stop-loss token missing");
        return false;
    }

    let targets = find_targets(&lower, &tokens);
    if !targets.any() {
        debug!("pre-filter: no take-profit token");
        return false;
    }

    true
}

// ─── Extraction ───────────────────────────────────────────────────────────────

/// Extract a structured order from text that already passed the pre-filter.
///
/// Side resolution prefers the colored-circle markers over text phrases;
/// returns `None` when any required field fails to materialise. The result
/// is *not* yet price-validated.
pub fn extract(text: &str) -> Option<ParsedOrder> {
    let lower = text.to_lowercase();
    let tokens = words(&lower);

    let pair = find_pair(text)?;

    let side = if text.contains(BUY_MARKER) {
        Side::Buy
    } else if text.contains(SELL_MARKER) {
        Side::Sell
    } else {
        find_side_phrase(&tokens)?
    };

    let entry_price = find_entry(&lower, &tokens)?;
    let stop_loss = find_stop(&lower, &tokens)?;

    let targets = find_targets(&lower, &tokens);
    let tp1 = targets.tp1?;

    Some(ParsedOrder {
        pair,
        side,
        entry_price,
        stop_loss,
        tp1,
        tp2: targets.tp2,
        tp3: targets.tp3,
        raw_text: text.to_string(),
    })
}

// ─── Strategy adapter ─────────────────────────────────────────────────────────

/// The pattern scanner as an extraction strategy. Runs last in the chain;
/// needs no I/O and never errors.
pub struct PatternExtractor;

#[async_trait]
impl ExtractStrategy for PatternExtractor {
    fn name(&self) -> &'static str {
        "pattern"
    }

    async fn try_extract(&self, text: &str) -> Option<ParsedOrder> {
        if !is_new_signal(text) {
            return None;
        }
        extract(text)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const CLASSIC_BUY: &str =
        "BUY LIMIT EURUSD @ 1.0850\nSL: 1.0800\nTP1: 1.0900\nTP2: 1.0950\nTP3: 1.1000";

    #[test]
    fn classic_buy_signal_extracts_all_levels() {
        assert!(is_new_signal(CLASSIC_BUY));

        let order = extract(CLASSIC_BUY).unwrap();
        assert_eq!(order.pair, "EURUSD");
        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.entry_price, 1.0850);
        assert_eq!(order.stop_loss, 1.0800);
        assert_eq!(order.tp1, 1.0900);
        assert_eq!(order.tp2, Some(1.0950));
        assert_eq!(order.tp3, Some(1.1000));
    }

    #[test]
    fn follow_up_vocabulary_is_filtered_out() {
        assert!(!is_new_signal("Close half position at TP2"));
        assert!(!is_new_signal("TP1 hit, move SL to entry"));
        assert!(!is_new_signal("SL to breakeven on EURUSD limit order @ 1.0850"));
    }

    #[test]
    fn market_orders_are_not_signals() {
        assert!(!is_new_signal("BUY MARKET EURUSD @ 1.0850 SL: 1.0800 TP1: 1.0900"));
    }

    #[test]
    fn sell_marker_with_single_unnumbered_target() {
        let text =
            "Placed a limit order on 🔴 GBPJPY\nEntry: 199.231\nTake-profit: 198.736\nStop-loss: 199.558";
        assert!(is_new_signal(text));

        let order = extract(text).unwrap();
        assert_eq!(order.pair, "GBPJPY");
        assert_eq!(order.side, Side::Sell);
        assert_eq!(order.entry_price, 199.231);
        assert_eq!(order.stop_loss, 199.558);
        assert_eq!(order.tp1, 198.736);
        assert_eq!(order.tp2, None);
        assert_eq!(order.tp3, None);
    }

    #[test]
    fn buy_marker_with_two_numbered_targets() {
        let text = "🟢 EURUSD limit order\nEntry: 1.0850\nSL: 1.0800\nTP1: 1.0900\nTP2: 1.0950";
        let order = extract(text).unwrap();
        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.tp1, 1.0900);
        assert_eq!(order.tp2, Some(1.0950));
        assert_eq!(order.tp3, None);
    }

    #[test]
    fn marker_beats_text_phrase_for_side() {
        let text = "🔴 BUY LIMIT EURUSD @ 1.0850 SL: 1.0900 TP1: 1.0800";
        let order = extract(text).unwrap();
        assert_eq!(order.side, Side::Sell);
    }

    #[test]
    fn numbered_targets_disable_the_unnumbered_pattern() {
        // A stray "Take profit" label must not leak into tp1 when numbered
        // tokens exist, which leaves this order without a tp1 at all.
        let text = "SELL LIMIT GBPUSD @ 1.2500\nSL: 1.2550\nTP2: 1.2400\nTake profit: 1.2475";

        let lower = text.to_lowercase();
        let tokens = super::words(&lower);
        let targets = find_targets(&lower, &tokens);
        assert!(targets.numbered);
        assert_eq!(targets.tp1, None);
        assert_eq!(targets.tp2, Some(1.2400));

        assert_eq!(extract(text), None);
    }

    #[test]
    fn price_integer_part_is_not_mistaken_for_a_level_digit() {
        let text = "🟢 EURUSD limit order @ 1.0850\nSL: 1.0800\nTake profit: 1.0900";
        let order = extract(text).unwrap();
        assert_eq!(order.tp1, 1.0900);
        assert_eq!(order.tp2, None);
    }

    #[test]
    fn target_profit_labels_parse_as_numbered() {
        let text = "#signals EURUSD Buy Limit Order: 1.16050 Target Profit 1: 1.16350 \
                    Target Profit 2: 1.16650 Target Profit 3: 1.16950 Stop Loss: 1.15750";

        // "Profit" outside "take profit" counts as follow-up vocabulary, so
        // the pre-filter never lets this format through — it reaches the
        // system via the AI strategy instead.
        assert!(!is_new_signal(text));

        // The field scanners still understand the labels.
        let order = extract(text).unwrap();
        assert_eq!(order.pair, "EURUSD");
        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.entry_price, 1.16050);
        assert_eq!(order.stop_loss, 1.15750);
        assert_eq!(order.tp1, 1.16350);
        assert_eq!(order.tp2, Some(1.16650));
        assert_eq!(order.tp3, Some(1.16950));
    }

    #[test]
    fn spaced_numbered_targets_parse() {
        let text = "BUY LIMIT USDJPY @ 145.20 SL 144.80 TP 1 145.60 TP 2 146.00";
        let order = extract(text).unwrap();
        assert_eq!(order.tp1, 145.60);
        assert_eq!(order.tp2, Some(146.00));
    }

    #[test]
    fn missing_pieces_fail_the_pre_filter() {
        // No pair
        assert!(!is_new_signal("BUY LIMIT @ 1.0850 SL: 1.0800 TP1: 1.0900"));
        // No stop
        assert!(!is_new_signal("BUY LIMIT EURUSD @ 1.0850 TP1: 1.0900"));
        // No take-profit
        assert!(!is_new_signal("BUY LIMIT EURUSD @ 1.0850 SL: 1.0800"));
        // Plain chatter
        assert!(!is_new_signal("Good morning traders, news at 14:00 today"));
    }

    #[test]
    fn pair_token_must_be_exactly_six_uppercase_letters() {
        assert_eq!(find_pair("watching EURUSD today"), Some("EURUSD".to_string()));
        assert_eq!(find_pair("watching EURUSDX today"), None);
        assert_eq!(find_pair("watching eurusd today"), None);
    }
}
