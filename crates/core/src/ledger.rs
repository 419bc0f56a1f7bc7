//! # Escrow Ledger
//!
//! Per-token record of the reserve principal a token's trades put into the
//! vault, the vault shares backing it, and the interest recognized and paid
//! out. Interest is whatever the shares are worth beyond what the ledger
//! already accounts for:
//!
//! ```text
//! pending = shares · rate − (principal + generated − withdrawn)
//! ```
//!
//! Negative pending is treated as zero. The transition functions here are
//! pure: they take a record and return the updated copy, so the exchange
//! can stage a change and commit it only after the collaborators succeed.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use stairway_math::{shares_for_value, value_of_shares, Rounding};
use stairway_types::{Address, ExchangeError, ExchangeResult, TokenExchangeInfo};

use crate::config::EscrowAttribution;

/// Keyed store of escrow records, one per token identity
#[derive(Debug, Default, Clone, Serialize)]
pub struct EscrowLedger {
    entries: HashMap<Address, TokenExchangeInfo>,
}

impl EscrowLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for `token`; unseen tokens read as zero
    pub fn get(&self, token: &Address) -> TokenExchangeInfo {
        self.entries.get(token).copied().unwrap_or_default()
    }

    /// Replace the record for `token` with a staged copy
    pub fn commit(&mut self, token: Address, info: TokenExchangeInfo) {
        self.entries.insert(token, info);
    }

    /// Records ordered by token identity
    pub fn to_sorted(&self) -> BTreeMap<Address, TokenExchangeInfo> {
        self.entries.iter().map(|(k, v)| (*k, *v)).collect()
    }
}

// ============================================================================
// Accrual
// ============================================================================

/// Interest the shares have earned beyond what the record accounts for
pub fn pending_interest(info: &TokenExchangeInfo, exchange_rate: u128) -> ExchangeResult<u128> {
    let value = value_of_shares(info.interest_shares, exchange_rate)?;
    let accounted = info
        .accounted_value()
        .ok_or_else(|| ExchangeError::overflow("pending_interest"))?;
    Ok(value.saturating_sub(accounted))
}

/// Move pending interest into `generated_interest`
pub fn accrue(info: &TokenExchangeInfo, exchange_rate: u128) -> ExchangeResult<TokenExchangeInfo> {
    let pending = pending_interest(info, exchange_rate)?;
    let generated_interest = info
        .generated_interest
        .checked_add(pending)
        .ok_or_else(|| ExchangeError::overflow("accrue"))?;

    Ok(TokenExchangeInfo {
        generated_interest,
        ..*info
    })
}

/// Staged result of an interest withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterestSettlement {
    /// Record to commit once the payout succeeds
    pub info: TokenExchangeInfo,
    /// Reserve value owed to the withdrawer
    pub payable: u128,
}

/// Accrue, then mark all recognized interest as withdrawn.
///
/// The shares redeemed for the payout leave the record too, rounded up to
/// match what the vault burns. A zero `payable` returns the accrued record
/// unchanged.
pub fn settle_withdrawal(info: &TokenExchangeInfo, exchange_rate: u128) -> ExchangeResult<InterestSettlement> {
    let accrued = accrue(info, exchange_rate)?;
    let payable = accrued.unclaimed_interest();
    if payable == 0 {
        return Ok(InterestSettlement { info: accrued, payable });
    }

    let redeemed_shares = shares_for_value(payable, exchange_rate, Rounding::Up)?;
    Ok(InterestSettlement {
        info: TokenExchangeInfo {
            interest_shares: accrued.interest_shares.saturating_sub(redeemed_shares),
            withdrawn_interest: accrued.generated_interest,
            ..accrued
        },
        payable,
    })
}

// ============================================================================
// Trade Attribution
// ============================================================================

/// Attribute a buy's principal and the shares it minted to the token
pub fn attribute_purchase(
    info: &TokenExchangeInfo,
    raw_cost: u128,
    exchange_rate: u128,
    policy: EscrowAttribution,
) -> ExchangeResult<TokenExchangeInfo> {
    if policy == EscrowAttribution::Deferred {
        return Ok(*info);
    }

    let minted = shares_for_value(raw_cost, exchange_rate, Rounding::Down)?;
    let overflow = || ExchangeError::overflow("attribute_purchase");

    Ok(TokenExchangeInfo {
        reserve_in_token: info.reserve_in_token.checked_add(raw_cost).ok_or_else(overflow)?,
        interest_shares: info.interest_shares.checked_add(minted).ok_or_else(overflow)?,
        ..*info
    })
}

/// Remove a sell's redeemed principal and the shares the vault burned for it.
///
/// Both saturate at zero, matching a vault that lets the last redeem take
/// whatever shares remain.
pub fn release_sale(
    info: &TokenExchangeInfo,
    raw_price: u128,
    exchange_rate: u128,
    policy: EscrowAttribution,
) -> ExchangeResult<TokenExchangeInfo> {
    if policy == EscrowAttribution::Deferred {
        return Ok(*info);
    }

    let burned = shares_for_value(raw_price, exchange_rate, Rounding::Up)?;

    Ok(TokenExchangeInfo {
        reserve_in_token: info.reserve_in_token.saturating_sub(raw_price),
        interest_shares: info.interest_shares.saturating_sub(burned),
        ..*info
    })
}
