/// 18-decimal fixed-point helpers and vault share conversion

use ethnum::U256;
use stairway_types::{ExchangeError, ExchangeResult, WAD};

use crate::safe::{safe_mul_u256, u256_to_u128};

/// Rounding mode for division operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Round down (towards zero)
    Down,
    /// Round up (away from zero)
    Up,
}

/// Multiply two values and divide by a third with specified rounding.
///
/// The product is held in 256 bits, so only a quotient that does not fit
/// u128 overflows.
pub fn mul_div(a: u128, b: u128, denominator: u128, rounding: Rounding) -> ExchangeResult<u128> {
    if denominator == 0 {
        return Err(ExchangeError::division_by_zero("mul_div"));
    }

    let product = safe_mul_u256(U256::new(a), U256::new(b), "mul_div")?;
    let denominator = U256::new(denominator);
    let quotient = product / denominator;

    let quotient = match rounding {
        Rounding::Up if product % denominator != U256::ZERO => quotient + U256::ONE,
        _ => quotient,
    };

    u256_to_u128(quotient, "mul_div")
}

// ============================================================================
// Vault Share Conversion
// ============================================================================

/// Reserve value of `shares` at a wad exchange rate, flooring
pub fn value_of_shares(shares: u128, exchange_rate: u128) -> ExchangeResult<u128> {
    mul_div(shares, exchange_rate, WAD, Rounding::Down)
}

/// Shares worth `value` at a wad exchange rate
pub fn shares_for_value(value: u128, exchange_rate: u128, rounding: Rounding) -> ExchangeResult<u128> {
    if exchange_rate == 0 {
        return Err(ExchangeError::division_by_zero("shares_for_value"));
    }
    mul_div(value, WAD, exchange_rate, rounding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_rounding() {
        assert_eq!(mul_div(10, 3, 4, Rounding::Down).unwrap(), 7);
        assert_eq!(mul_div(10, 3, 4, Rounding::Up).unwrap(), 8);
        assert_eq!(mul_div(10, 4, 5, Rounding::Up).unwrap(), 8);
    }

    #[test]
    fn test_mul_div_wide_product() {
        // (2^127)·4 overflows u128 but the quotient does not
        let a = 1u128 << 127;
        assert_eq!(mul_div(a, 4, 8, Rounding::Down).unwrap(), a / 2);
        assert!(mul_div(u128::MAX, u128::MAX, 1, Rounding::Down).is_err());
        assert!(mul_div(1, 1, 0, Rounding::Down).is_err());
    }

    #[test]
    fn test_share_conversion() {
        let rate = WAD + WAD / 2; // 1.5 reserve per share
        assert_eq!(value_of_shares(2 * WAD, rate).unwrap(), 3 * WAD);
        assert_eq!(shares_for_value(3 * WAD, rate, Rounding::Down).unwrap(), 2 * WAD);

        // 1 base unit at 1.5: 0.66.. shares
        assert_eq!(shares_for_value(1, rate, Rounding::Down).unwrap(), 0);
        assert_eq!(shares_for_value(1, rate, Rounding::Up).unwrap(), 1);
        assert!(shares_for_value(1, 0, Rounding::Down).is_err());
    }
}
