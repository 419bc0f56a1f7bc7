//! # Staircase Bonding Curve
//!
//! Price is held constant across each interval of `tokens_per_interval`
//! tokens and steps up by `price_rise` when an interval completes:
//!
//! ```text
//! price
//!   │                 ┌──────
//!   │          ┌──────┘  b+2r
//!   │   ┌──────┘  b+r
//!   │───┘  b
//!   └──────────────────────────▶ supply
//!       t      2t     3t
//! ```
//!
//! The cost of moving supply from zero to `amount` is the area under the
//! staircase. With `n = amount / t` completed intervals:
//!
//! ```text
//! Σ_{i<n} t·(b + i·r) = n·t·b + r·t·n·(n−1)/2
//! partial interval    = (amount − n·t)·(b + n·r)
//! cost                = (complete + partial) / 10^18
//! ```
//!
//! Prices and amounts both carry 18 decimals, so the product is divided by
//! `10^18` once at the end. Intermediates are 256-bit and every step is
//! checked.

use ethnum::U256;
use stairway_types::{ExchangeError, ExchangeResult, WAD};

use crate::safe::{safe_add_u256, safe_mul_u256, safe_sub_u128, u256_to_u128};

const OP: &str = "cost_from_zero";

/// Area under the staircase from zero to `amount`, before removing the
/// 18-decimal scale.
///
/// Additive: the scaled cost of `amount + 1` equals the scaled cost of
/// `amount` plus the marginal price at `amount`.
pub fn scaled_cost_from_zero(
    base_cost: u128,
    price_rise: u128,
    tokens_per_interval: u128,
    amount: u128,
) -> ExchangeResult<U256> {
    if tokens_per_interval == 0 {
        return Err(ExchangeError::division_by_zero(OP));
    }

    let completed = amount / tokens_per_interval;
    // completed·t <= amount, so neither step can overflow
    let remainder = amount - completed * tokens_per_interval;

    let n = U256::new(completed);
    let t = U256::new(tokens_per_interval);
    let b = U256::new(base_cost);
    let r = U256::new(price_rise);

    // n·t·b
    let base_area = safe_mul_u256(safe_mul_u256(n, t, OP)?, b, OP)?;

    // r·t·n·(n−1)/2; n·(n−1) is always even
    let steps = if completed == 0 {
        U256::ZERO
    } else {
        safe_mul_u256(n, n - U256::ONE, OP)? / U256::new(2)
    };
    let rise_area = safe_mul_u256(safe_mul_u256(r, t, OP)?, steps, OP)?;

    // (amount − n·t)·(b + n·r)
    let marginal = safe_add_u256(b, safe_mul_u256(n, r, OP)?, OP)?;
    let partial_area = safe_mul_u256(U256::new(remainder), marginal, OP)?;

    safe_add_u256(safe_add_u256(base_area, rise_area, OP)?, partial_area, OP)
}

/// Total reserve cost to take supply from zero to `amount`
pub fn cost_from_zero(
    base_cost: u128,
    price_rise: u128,
    tokens_per_interval: u128,
    amount: u128,
) -> ExchangeResult<u128> {
    let scaled = scaled_cost_from_zero(base_cost, price_rise, tokens_per_interval, amount)?;
    u256_to_u128(scaled / U256::new(WAD), OP)
}

/// Raw cost of minting `amount` tokens on top of `supply`
pub fn raw_cost_for_buying(
    base_cost: u128,
    price_rise: u128,
    tokens_per_interval: u128,
    supply: u128,
    amount: u128,
) -> ExchangeResult<u128> {
    let new_supply = supply
        .checked_add(amount)
        .ok_or_else(|| ExchangeError::overflow("raw_cost_for_buying"))?;

    let after = cost_from_zero(base_cost, price_rise, tokens_per_interval, new_supply)?;
    let before = cost_from_zero(base_cost, price_rise, tokens_per_interval, supply)?;
    safe_sub_u128(after, before, "raw_cost_for_buying")
}

/// Raw reserve released by burning `amount` tokens out of `supply`
pub fn raw_price_for_selling(
    base_cost: u128,
    price_rise: u128,
    tokens_per_interval: u128,
    supply: u128,
    amount: u128,
) -> ExchangeResult<u128> {
    if amount > supply {
        return Err(ExchangeError::AmountExceedsSupply { amount, supply });
    }

    let before = cost_from_zero(base_cost, price_rise, tokens_per_interval, supply)?;
    let after = cost_from_zero(base_cost, price_rise, tokens_per_interval, supply - amount)?;
    safe_sub_u128(before, after, "raw_price_for_selling")
}

/// Marginal price of the next token base unit at `supply`
pub fn price_at_supply(
    base_cost: u128,
    price_rise: u128,
    tokens_per_interval: u128,
    supply: u128,
) -> ExchangeResult<u128> {
    if tokens_per_interval == 0 {
        return Err(ExchangeError::division_by_zero("price_at_supply"));
    }

    (supply / tokens_per_interval)
        .checked_mul(price_rise)
        .and_then(|rise| rise.checked_add(base_cost))
        .ok_or_else(|| ExchangeError::overflow("price_at_supply"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const B: u128 = WAD;
    const R: u128 = WAD / 10;
    const T: u128 = 1000 * WAD;

    #[test]
    fn test_remainder_only_pricing() {
        // No completed interval: 500 tokens at the base price
        assert_eq!(cost_from_zero(B, R, T, 500 * WAD).unwrap(), 500 * WAD);
        assert_eq!(raw_cost_for_buying(B, R, T, 0, 500 * WAD).unwrap(), 500 * WAD);
    }

    #[test]
    fn test_completing_first_interval() {
        // The rise only applies from interval 1 onwards
        assert_eq!(raw_cost_for_buying(B, R, T, 500 * WAD, 500 * WAD).unwrap(), 500 * WAD);
        assert_eq!(cost_from_zero(B, R, T, 1000 * WAD).unwrap(), 1000 * WAD);
    }

    #[test]
    fn test_closed_form_with_completed_intervals() {
        // 1000 @ 1.0 + 1000 @ 1.1 + 500 @ 1.2
        assert_eq!(cost_from_zero(B, R, T, 2500 * WAD).unwrap(), 2700 * WAD);
        // 1000 @ 1.0 + 1000 @ 1.1 + 1000 @ 1.2
        assert_eq!(cost_from_zero(B, R, T, 3000 * WAD).unwrap(), 3300 * WAD);
    }

    #[test]
    fn test_zero_amount_costs_nothing() {
        assert_eq!(cost_from_zero(B, R, T, 0).unwrap(), 0);
        assert_eq!(raw_cost_for_buying(B, R, T, 1234 * WAD, 0).unwrap(), 0);
        assert_eq!(raw_price_for_selling(B, R, T, 1234 * WAD, 0).unwrap(), 0);
    }

    #[test]
    fn test_sell_mirrors_buy() {
        let bought = raw_cost_for_buying(B, R, T, 800 * WAD, 1700 * WAD).unwrap();
        let sold = raw_price_for_selling(B, R, T, 2500 * WAD, 1700 * WAD).unwrap();
        assert_eq!(bought, sold);
    }

    #[test]
    fn test_sell_more_than_supply_fails() {
        assert_eq!(
            raw_price_for_selling(B, R, T, 10, 11),
            Err(ExchangeError::AmountExceedsSupply { amount: 11, supply: 10 })
        );
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(matches!(
            cost_from_zero(B, R, 0, WAD),
            Err(ExchangeError::DivisionByZero { .. })
        ));
        assert!(price_at_supply(B, R, 0, WAD).is_err());
    }

    #[test]
    fn test_floors_sub_wad_amounts() {
        // 1 base unit at a price of 0.5 is worth half a base unit
        assert_eq!(cost_from_zero(WAD / 2, 0, T, 1).unwrap(), 0);
        assert_eq!(cost_from_zero(WAD / 2, 0, T, 3).unwrap(), 1);
    }

    #[test]
    fn test_overflow_is_an_error() {
        let result = cost_from_zero(u128::MAX, u128::MAX, 1, u128::MAX);
        assert!(matches!(result, Err(ExchangeError::ArithmeticOverflow { .. })));
        assert!(raw_cost_for_buying(B, R, T, u128::MAX, 1).is_err());
    }

    #[test]
    fn test_marginal_price() {
        assert_eq!(price_at_supply(B, R, T, 0).unwrap(), B);
        assert_eq!(price_at_supply(B, R, T, 999 * WAD).unwrap(), B);
        assert_eq!(price_at_supply(B, R, T, 1000 * WAD).unwrap(), B + R);
        assert_eq!(price_at_supply(B, R, T, 2500 * WAD).unwrap(), B + 2 * R);
    }
}
