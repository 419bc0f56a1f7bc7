//! Core trait abstractions for the exchange's collaborators
//!
//! The exchange never owns token balances, market configuration, vault
//! positions or reserve balances. It drives them through these ports.
//! Mutable collaborators are also `Revertible` so a failed settlement can
//! undo the steps that already ran.

use std::sync::Arc;

use stairway_types::{Address, ExchangeResult, MarketId, MarketParams};

/// Opaque handle to a saved collaborator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(pub u64);

/// Save/restore hook used by staged settlement
pub trait Revertible {
    /// Save the current state and return a handle to it
    fn checkpoint(&self) -> Checkpoint;

    /// Restore the state saved at `checkpoint`, discarding later changes
    fn revert_to(&self, checkpoint: Checkpoint);

    /// Keep the current state and forget the checkpoint
    fn release(&self, checkpoint: Checkpoint);
}

/// Market configuration lookup
pub trait MarketRegistry: Send + Sync {
    /// Market a token identity belongs to, if it exists
    fn resolve_token(&self, token: &Address) -> Option<MarketId>;

    /// Curve and fee parameters of a market, if it exists
    fn resolve_market(&self, market_id: MarketId) -> Option<MarketParams>;
}

/// Market token mint/burn bookkeeping
pub trait TokenLedger: Revertible + Send + Sync {
    /// Outstanding supply of a token
    fn total_supply(&self, token: &Address) -> u128;

    /// Balance of a holder
    fn balance_of(&self, token: &Address, holder: &Address) -> u128;

    /// Create `amount` tokens for `recipient`
    fn mint(&self, token: &Address, recipient: &Address, amount: u128) -> ExchangeResult<()>;

    /// Destroy `amount` tokens held by `holder`
    fn burn(&self, token: &Address, holder: &Address, amount: u128) -> ExchangeResult<()>;
}

/// Yield-bearing vault holding the reserve principal
pub trait YieldVault: Revertible + Send + Sync {
    /// Account that receives principal before it is invested
    fn address(&self) -> Address;

    /// Convert `amount` of reserve already held by the vault into shares
    fn invest(&self, amount: u128) -> ExchangeResult<()>;

    /// Pay `amount` of reserve value out to `recipient`
    fn redeem(&self, recipient: &Address, amount: u128) -> bool;

    /// Bring the exchange rate up to date
    fn accrue_interest(&self) -> ExchangeResult<()>;

    /// Reserve value per share, 18-decimal fixed point
    fn exchange_rate(&self) -> u128;
}

/// Stable reserve asset with allowances
pub trait ReserveAsset: Revertible + Send + Sync {
    /// Balance of a holder
    fn balance_of(&self, holder: &Address) -> u128;

    /// Amount `owner` lets `spender` move
    fn allowance(&self, owner: &Address, spender: &Address) -> u128;

    /// Move `amount` out of `from`'s own balance
    fn transfer(&self, from: &Address, to: &Address, amount: u128) -> bool;

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming allowance
    fn transfer_from(&self, spender: &Address, from: &Address, to: &Address, amount: u128) -> bool;
}

/// References to the four collaborators, fixed at initialization
#[derive(Clone)]
pub struct Collaborators {
    pub registry: Arc<dyn MarketRegistry>,
    pub token: Arc<dyn TokenLedger>,
    pub vault: Arc<dyn YieldVault>,
    pub reserve: Arc<dyn ReserveAsset>,
}
