//! Property tests for side-dependent price-ordering validation.

use proptest::prelude::*;

use spyglass::order::{ParsedOrder, Side};

// ── Strategies (proptest) ─────────────────────────────────────────────────────

/// Prices on a 0.001 grid so equal levels are actually reachable.
fn arb_price() -> impl Strategy<Value = f64> {
    (1u32..10_000_000).prop_map(|n| n as f64 / 1000.0)
}

fn order(
    side: Side,
    entry: f64,
    stop: f64,
    tp1: f64,
    tp2: Option<f64>,
    tp3: Option<f64>,
) -> ParsedOrder {
    ParsedOrder {
        pair: "EURUSD".to_string(),
        side,
        entry_price: entry,
        stop_loss: stop,
        tp1,
        tp2,
        tp3,
        raw_text: String::new(),
    }
}

// ── Properties ────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn buy_validity_matches_the_ordering_predicate(
        entry in arb_price(),
        stop in arb_price(),
        tp1 in arb_price(),
        tp2 in arb_price(),
        tp3 in arb_price(),
    ) {
        let expected = stop < entry && entry < tp1 && tp1 < tp2 && tp2 < tp3;
        let order = order(Side::Buy, entry, stop, tp1, Some(tp2), Some(tp3));
        prop_assert_eq!(order.is_valid(), expected);
    }

    #[test]
    fn sell_validity_matches_the_ordering_predicate(
        entry in arb_price(),
        stop in arb_price(),
        tp1 in arb_price(),
        tp2 in arb_price(),
        tp3 in arb_price(),
    ) {
        let expected = tp3 < tp2 && tp2 < tp1 && tp1 < entry && entry < stop;
        let order = order(Side::Sell, entry, stop, tp1, Some(tp2), Some(tp3));
        prop_assert_eq!(order.is_valid(), expected);
    }

    #[test]
    fn single_target_buy_needs_stop_entry_tp1_ascending(
        entry in arb_price(),
        stop in arb_price(),
        tp1 in arb_price(),
    ) {
        let expected = stop < entry && entry < tp1;
        let order = order(Side::Buy, entry, stop, tp1, None, None);
        prop_assert_eq!(order.is_valid(), expected);
    }

    #[test]
    fn tp3_without_tp2_is_never_valid(
        entry in arb_price(),
        stop in arb_price(),
        tp1 in arb_price(),
        tp3 in arb_price(),
    ) {
        let buy = order(Side::Buy, entry, stop, tp1, None, Some(tp3));
        prop_assert!(!buy.is_valid());

        let sell = order(Side::Sell, entry, stop, tp1, None, Some(tp3));
        prop_assert!(!sell.is_valid());
    }

    #[test]
    fn well_ordered_ladders_are_valid_for_exactly_one_side(
        raw in proptest::collection::btree_set(1u32..10_000_000, 5)
    ) {
        let prices: Vec<f64> = raw.into_iter().map(|n| n as f64 / 1000.0).collect();
        // BTreeSet gives 5 distinct ascending prices.
        let buy = order(Side::Buy, prices[1], prices[0], prices[2], Some(prices[3]), Some(prices[4]));
        prop_assert!(buy.is_valid());

        let sell = order(Side::Sell, prices[1], prices[0], prices[2], Some(prices[3]), Some(prices[4]));
        prop_assert!(!sell.is_valid());
    }
}
