/// Market parameters and trade quotes

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{ExchangeError, ExchangeResult};

// ============================================================================
// Market Identity
// ============================================================================

/// Identifier of a market in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketId(pub u64);

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Curve Parameters
// ============================================================================

/// Bonding-curve and fee parameters of one market.
///
/// `base_cost` and `price_rise` are 18-decimal prices; `tokens_per_interval`
/// is a token amount in base units. The trading fee is the rational
/// `trading_fee_rate / trading_fee_rate_scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketParams {
    /// Price of the first interval
    pub base_cost: u128,
    /// Price increment per completed interval
    pub price_rise: u128,
    /// Width of an interval in token base units
    pub tokens_per_interval: u128,
    /// Fee numerator
    pub trading_fee_rate: u128,
    /// Fee denominator
    pub trading_fee_rate_scale: u128,
}

impl MarketParams {
    /// Check the invariants the curve and fee math rely on
    pub fn validate(&self, market_id: MarketId) -> ExchangeResult<()> {
        if self.tokens_per_interval == 0 {
            return Err(ExchangeError::invalid_market(
                market_id,
                "tokens_per_interval must be greater than 0",
            ));
        }
        if self.trading_fee_rate_scale == 0 {
            return Err(ExchangeError::invalid_market(
                market_id,
                "trading_fee_rate_scale must be greater than 0",
            ));
        }
        if self.trading_fee_rate > self.trading_fee_rate_scale {
            return Err(ExchangeError::invalid_market(
                market_id,
                "trading_fee_rate must not exceed trading_fee_rate_scale",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Quotes
// ============================================================================

/// Curve amount split into raw amount and trading fee.
///
/// For buys `total = raw + fee` is what the buyer pays; for sells
/// `total = raw - fee` is what the seller receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Bonding-curve amount before fees
    pub raw: u128,
    /// Trading fee
    pub fee: u128,
    /// Amount after applying the fee
    pub total: u128,
}
