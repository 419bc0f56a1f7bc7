/// Protocol constants used across the Stairway crates

// ============================================================================
// Fixed-Point Constants
// ============================================================================

/// Number of decimals of every token and reserve amount
pub const DECIMALS: u32 = 18;

/// 18-decimal fixed-point scale factor (one whole unit)
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Exchange rate of a vault whose shares are worth exactly one reserve unit
pub const INITIAL_EXCHANGE_RATE: u128 = WAD;

// ============================================================================
// Fee Constants
// ============================================================================

/// Conventional fee scale (10,000 = 100%)
pub const BPS_DENOMINATOR: u128 = 10_000;
