/// Results returned by committed exchange operations

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::market::CostBreakdown;

/// Direction of a trade against the curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Outcome of a committed buy or sell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub side: TradeSide,
    /// Token identity that was minted or burned
    pub token: Address,
    /// Tokens minted or burned
    pub amount: u128,
    /// Receiver of the minted tokens or the reserve payout
    pub recipient: Address,
    /// Raw curve amount, fee and total paid or received
    pub quote: CostBreakdown,
    /// Token supply after the trade
    pub supply_after: u128,
}
