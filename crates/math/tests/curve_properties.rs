//! Property-based tests for the staircase curve and fee quotes.
//! Verifies monotonicity, per-unit consistency and buy/sell asymmetry.
//!
//! Costs are floored from the scaled integral, so the unscaled cost is
//! only non-decreasing in amount; strict growth is checked on the scaled
//! integral.

use proptest::prelude::*;
use stairway_math::*;
use stairway_types::{MarketParams, WAD};

// ============================================================================
// Test Strategies
// ============================================================================

/// Base cost between one base unit and 100 reserve units
fn base_costs() -> impl Strategy<Value = u128> {
    1u128..=100 * WAD
}

/// Price rise between zero and 10 reserve units
fn price_rises() -> impl Strategy<Value = u128> {
    0u128..=10 * WAD
}

/// Interval width between one and 10,000 whole tokens
fn intervals() -> impl Strategy<Value = u128> {
    (1u128..=10_000).prop_map(|v| v * WAD)
}

/// Whole-token amounts keep the scaled integral divisible by WAD
fn whole_tokens(max: u128) -> impl Strategy<Value = u128> {
    (0u128..=max).prop_map(|v| v * WAD)
}

fn market(b: u128, r: u128, t: u128, fee_rate: u128) -> MarketParams {
    MarketParams {
        base_cost: b,
        price_rise: r,
        tokens_per_interval: t,
        trading_fee_rate: fee_rate,
        trading_fee_rate_scale: 10_000,
    }
}

// ============================================================================
// Curve Properties
// ============================================================================

proptest! {
    /// Buying more never costs less
    #[test]
    fn prop_cost_increases_with_amount(
        b in base_costs(),
        r in price_rises(),
        t in intervals(),
        supply in 0u128..=1_000_000 * WAD,
        amount in 0u128..=1_000_000 * WAD,
        extra in 1u128..=1_000 * WAD,
    ) {
        let smaller = raw_cost_for_buying(b, r, t, supply, amount).unwrap();
        let larger = raw_cost_for_buying(b, r, t, supply, amount + extra).unwrap();
        prop_assert!(larger >= smaller);

        let scaled_small = scaled_cost_from_zero(b, r, t, supply + amount).unwrap();
        let scaled_large = scaled_cost_from_zero(b, r, t, supply + amount + extra).unwrap();
        prop_assert!(scaled_large > scaled_small, "positive base cost must strictly increase the integral");
    }

    /// Later buyers never pay less for the same quantity
    #[test]
    fn prop_cost_increases_with_supply(
        b in base_costs(),
        r in price_rises(),
        t in intervals(),
        supply in whole_tokens(1_000_000),
        later in whole_tokens(100_000),
        amount in whole_tokens(100_000),
    ) {
        let early = raw_cost_for_buying(b, r, t, supply, amount).unwrap();
        let late = raw_cost_for_buying(b, r, t, supply + later, amount).unwrap();
        prop_assert!(late >= early, "early={} late={}", early, late);
    }

    /// The integral grows by exactly the marginal price per base unit
    #[test]
    fn prop_unit_consistency(
        b in base_costs(),
        r in price_rises(),
        t in intervals(),
        amount in 1u128..=10_000_000 * WAD,
    ) {
        let current = scaled_cost_from_zero(b, r, t, amount).unwrap();
        let previous = scaled_cost_from_zero(b, r, t, amount - 1).unwrap();
        let unit_price = price_at_supply(b, r, t, amount - 1).unwrap();
        prop_assert_eq!(current, previous + U256::new(unit_price));
    }

    /// Selling right after buying never returns more than was paid
    #[test]
    fn prop_round_trip_never_profits(
        b in base_costs(),
        r in price_rises(),
        t in intervals(),
        supply in 0u128..=1_000_000 * WAD,
        amount in 1u128..=1_000_000 * WAD,
        fee_rate in 1u128..=1_000,
    ) {
        let params = market(b, r, t, fee_rate);
        let buy = quote_buy(&params, supply, amount).unwrap();
        let sell = quote_sell(&params, supply + amount, amount).unwrap();

        prop_assert_eq!(buy.raw, sell.raw);
        prop_assert!(sell.total <= buy.total);
    }

    /// Without fees the round trip is exact
    #[test]
    fn prop_round_trip_without_fee_is_exact(
        b in base_costs(),
        r in price_rises(),
        t in intervals(),
        supply in 0u128..=1_000_000 * WAD,
        amount in 1u128..=1_000_000 * WAD,
    ) {
        let params = market(b, r, t, 0);
        let buy = quote_buy(&params, supply, amount).unwrap();
        let sell = quote_sell(&params, supply + amount, amount).unwrap();
        prop_assert_eq!(buy.total, sell.total);
    }
}
