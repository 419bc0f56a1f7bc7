/// Trading-fee math and full trade quotes

use stairway_types::{CostBreakdown, ExchangeResult, MarketParams};

use crate::curve::{raw_cost_for_buying, raw_price_for_selling};
use crate::safe::{safe_add_u128, safe_sub_u128};
use crate::wad::{mul_div, Rounding};

/// Fee charged on a raw curve amount: `raw · rate / scale`, floored
pub fn trading_fee(raw: u128, fee_rate: u128, fee_rate_scale: u128) -> ExchangeResult<u128> {
    mul_div(raw, fee_rate, fee_rate_scale, Rounding::Down)
}

/// Quote for minting `amount` tokens at `supply`: the buyer pays `raw + fee`
pub fn quote_buy(params: &MarketParams, supply: u128, amount: u128) -> ExchangeResult<CostBreakdown> {
    let raw = raw_cost_for_buying(
        params.base_cost,
        params.price_rise,
        params.tokens_per_interval,
        supply,
        amount,
    )?;
    let fee = trading_fee(raw, params.trading_fee_rate, params.trading_fee_rate_scale)?;
    let total = safe_add_u128(raw, fee, "quote_buy")?;

    Ok(CostBreakdown { raw, fee, total })
}

/// Quote for burning `amount` tokens at `supply`: the seller receives `raw - fee`
pub fn quote_sell(params: &MarketParams, supply: u128, amount: u128) -> ExchangeResult<CostBreakdown> {
    let raw = raw_price_for_selling(
        params.base_cost,
        params.price_rise,
        params.tokens_per_interval,
        supply,
        amount,
    )?;
    let fee = trading_fee(raw, params.trading_fee_rate, params.trading_fee_rate_scale)?;
    let total = safe_sub_u128(raw, fee, "quote_sell")?;

    Ok(CostBreakdown { raw, fee, total })
}
