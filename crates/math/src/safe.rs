/// Safe arithmetic operations with overflow protection
///
/// All operations return errors instead of panicking or wrapping.

use ethnum::U256;
use stairway_types::{ExchangeError, ExchangeResult};

// ============================================================================
// Safe Basic Arithmetic
// ============================================================================

/// Safe addition for u128 values
pub fn safe_add_u128(a: u128, b: u128, operation: &str) -> ExchangeResult<u128> {
    a.checked_add(b)
        .ok_or_else(|| ExchangeError::overflow(operation))
}

/// Safe subtraction for u128 values
pub fn safe_sub_u128(a: u128, b: u128, operation: &str) -> ExchangeResult<u128> {
    a.checked_sub(b)
        .ok_or_else(|| ExchangeError::overflow(operation))
}

/// Safe multiplication for u128 values
pub fn safe_mul_u128(a: u128, b: u128, operation: &str) -> ExchangeResult<u128> {
    a.checked_mul(b)
        .ok_or_else(|| ExchangeError::overflow(operation))
}

// ============================================================================
// 256-bit Intermediates
// ============================================================================

/// Safe addition for U256 values
pub fn safe_add_u256(a: U256, b: U256, operation: &str) -> ExchangeResult<U256> {
    a.checked_add(b)
        .ok_or_else(|| ExchangeError::overflow(operation))
}

/// Safe multiplication for U256 values
pub fn safe_mul_u256(a: U256, b: U256, operation: &str) -> ExchangeResult<U256> {
    a.checked_mul(b)
        .ok_or_else(|| ExchangeError::overflow(operation))
}

/// Narrow a U256 back to u128, failing if the high word is set
pub fn u256_to_u128(value: U256, operation: &str) -> ExchangeResult<u128> {
    let (hi, lo) = value.into_words();
    if hi != 0 {
        return Err(ExchangeError::overflow(operation));
    }
    Ok(lo)
}
