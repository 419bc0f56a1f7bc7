//! # Token Exchange
//!
//! Public surface of the engine: quotes, buys, sells, interest withdrawal
//! and withdrawer rotation.
//!
//! Every call runs under one mutual-exclusion boundary over the escrow
//! ledger and the withdrawer map. Mutating calls validate first, then run
//! the collaborator steps inside a [`StagedSettlement`], and write the
//! staged ledger record back only after every step succeeded.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use stairway_math::{quote_buy, quote_sell};
use stairway_types::{
    Address, CostBreakdown, ExchangeError, ExchangeResult, MarketParams, TokenExchangeInfo,
    TradeReceipt, TradeSide,
};
use tracing::{debug, info, warn};

use crate::authority::WithdrawerRegistry;
use crate::config::ExchangeConfig;
use crate::ledger::{self, EscrowLedger};
use crate::ports::Collaborators;
use crate::settlement::StagedSettlement;

/// Durable state guarded by the exchange lock
#[derive(Debug, Default)]
struct ExchangeState {
    ledger: EscrowLedger,
    withdrawers: WithdrawerRegistry,
}

/// Serializable image of the exchange's durable state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangeSnapshot {
    pub owner: Address,
    pub fee_recipient: Address,
    pub exchange_address: Address,
    pub vault: Address,
    pub ledger: BTreeMap<Address, TokenExchangeInfo>,
    pub withdrawers: BTreeMap<Address, Address>,
}

/// Bonding-curve exchange with per-token escrow accounting
pub struct TokenExchange {
    config: ExchangeConfig,
    collaborators: Collaborators,
    state: Mutex<ExchangeState>,
}

impl TokenExchange {
    /// One-time setup; the configuration and collaborators cannot change afterwards
    pub fn initialize(config: ExchangeConfig, collaborators: Collaborators) -> ExchangeResult<Self> {
        config.validate()?;

        info!(
            owner = %config.owner,
            fee_recipient = %config.fee_recipient,
            exchange = %config.exchange_address,
            vault = %collaborators.vault.address(),
            attribution = ?config.escrow_attribution,
            "exchange initialized"
        );

        Ok(Self {
            config,
            collaborators,
            state: Mutex::new(ExchangeState::default()),
        })
    }

    pub fn owner(&self) -> Address {
        self.config.owner
    }

    pub fn fee_recipient(&self) -> Address {
        self.config.fee_recipient
    }

    // ========================================================================
    // Quotes
    // ========================================================================

    /// Cost of buying `amount` tokens at the current supply
    pub fn get_cost_for_buying_tokens(&self, token: &Address, amount: u128) -> ExchangeResult<CostBreakdown> {
        let _state = self.lock_state()?;
        let params = self.resolve_params(token)?;
        let supply = self.collaborators.token.total_supply(token);
        quote_buy(&params, supply, amount)
    }

    /// Proceeds of selling `amount` tokens at the current supply
    pub fn get_price_for_selling_tokens(&self, token: &Address, amount: u128) -> ExchangeResult<CostBreakdown> {
        let _state = self.lock_state()?;
        let params = self.resolve_params(token)?;
        let supply = self.collaborators.token.total_supply(token);
        quote_sell(&params, supply, amount)
    }

    // ========================================================================
    // Trades
    // ========================================================================

    /// Mint `amount` tokens to `recipient`, paid for by `caller`.
    ///
    /// The raw curve cost goes to the vault as principal and the fee to the
    /// fee recipient. Fails with `SlippageExceeded` if the total exceeds
    /// `max_cost`.
    pub fn buy_tokens(
        &self,
        caller: &Address,
        token: &Address,
        amount: u128,
        max_cost: u128,
        recipient: &Address,
    ) -> ExchangeResult<TradeReceipt> {
        if amount == 0 {
            return Err(ExchangeError::ZeroAmount);
        }

        let mut state = self.lock_state()?;
        let params = self.resolve_params(token)?;
        let supply = self.collaborators.token.total_supply(token);
        let quote = quote_buy(&params, supply, amount)?;
        debug!(%token, amount, supply, raw = quote.raw, fee = quote.fee, "buy quoted");

        if quote.total > max_cost {
            return Err(ExchangeError::SlippageExceeded {
                quoted: quote.total,
                bound: max_cost,
            });
        }

        let exchange = self.config.exchange_address;
        let approved = self.collaborators.reserve.allowance(caller, &exchange);
        if approved < quote.total {
            return Err(ExchangeError::InsufficientAllowance {
                approved,
                required: quote.total,
            });
        }

        let staged = StagedSettlement::begin("buy_tokens", &self.collaborators);
        let reserve = &self.collaborators.reserve;
        let vault = &self.collaborators.vault;

        if !reserve.transfer_from(&exchange, caller, &vault.address(), quote.raw) {
            return Err(ExchangeError::transfer_failed("buy_tokens: principal to vault"));
        }
        if quote.fee > 0 && !reserve.transfer_from(&exchange, caller, &self.config.fee_recipient, quote.fee) {
            return Err(ExchangeError::transfer_failed("buy_tokens: fee to recipient"));
        }

        vault.invest(quote.raw)?;
        self.collaborators.token.mint(token, recipient, amount)?;

        let entry = ledger::attribute_purchase(
            &state.ledger.get(token),
            quote.raw,
            vault.exchange_rate(),
            self.config.escrow_attribution,
        )?;

        staged.commit();
        state.ledger.commit(*token, entry);

        info!(%token, %caller, %recipient, amount, raw = quote.raw, fee = quote.fee, "tokens bought");
        Ok(TradeReceipt {
            side: TradeSide::Buy,
            token: *token,
            amount,
            recipient: *recipient,
            quote,
            supply_after: supply + amount,
        })
    }

    /// Burn `amount` of `caller`'s tokens and pay the proceeds to `recipient`.
    ///
    /// The raw curve price is redeemed from the vault into exchange custody,
    /// then split between `recipient` and the fee recipient. Fails with
    /// `SlippageExceeded` if the proceeds fall below `min_price`.
    pub fn sell_tokens(
        &self,
        caller: &Address,
        token: &Address,
        amount: u128,
        min_price: u128,
        recipient: &Address,
    ) -> ExchangeResult<TradeReceipt> {
        if amount == 0 {
            return Err(ExchangeError::ZeroAmount);
        }

        let mut state = self.lock_state()?;
        let params = self.resolve_params(token)?;
        let supply = self.collaborators.token.total_supply(token);
        let quote = quote_sell(&params, supply, amount)?;
        debug!(%token, amount, supply, raw = quote.raw, fee = quote.fee, "sell quoted");

        if quote.total < min_price {
            return Err(ExchangeError::SlippageExceeded {
                quoted: quote.total,
                bound: min_price,
            });
        }

        let balance = self.collaborators.token.balance_of(token, caller);
        if balance < amount {
            return Err(ExchangeError::InsufficientBalance {
                balance,
                required: amount,
            });
        }

        let staged = StagedSettlement::begin("sell_tokens", &self.collaborators);
        let exchange = self.config.exchange_address;
        let reserve = &self.collaborators.reserve;
        let vault = &self.collaborators.vault;

        self.collaborators.token.burn(token, caller, amount)?;

        if !vault.redeem(&exchange, quote.raw) {
            return Err(ExchangeError::transfer_failed("sell_tokens: redeem from vault"));
        }
        if !reserve.transfer(&exchange, recipient, quote.total) {
            return Err(ExchangeError::transfer_failed("sell_tokens: proceeds to recipient"));
        }
        if quote.fee > 0 && !reserve.transfer(&exchange, &self.config.fee_recipient, quote.fee) {
            return Err(ExchangeError::transfer_failed("sell_tokens: fee to recipient"));
        }

        let entry = ledger::release_sale(
            &state.ledger.get(token),
            quote.raw,
            vault.exchange_rate(),
            self.config.escrow_attribution,
        )?;

        staged.commit();
        state.ledger.commit(*token, entry);

        info!(%token, %caller, %recipient, amount, raw = quote.raw, fee = quote.fee, "tokens sold");
        Ok(TradeReceipt {
            side: TradeSide::Sell,
            token: *token,
            amount,
            recipient: *recipient,
            quote,
            supply_after: supply - amount,
        })
    }

    // ========================================================================
    // Interest
    // ========================================================================

    /// Pay all interest recognized for `token` to its authorized withdrawer.
    ///
    /// Returns the amount paid; zero means nothing was owed and nothing
    /// moved.
    pub fn withdraw_interest(&self, caller: &Address, token: &Address) -> ExchangeResult<u128> {
        let mut state = self.lock_state()?;
        if !state.withdrawers.is_withdrawer(token, caller) {
            warn!(%token, %caller, "interest withdrawal rejected");
            return Err(ExchangeError::NotAuthorized { caller: *caller });
        }

        let staged = StagedSettlement::begin("withdraw_interest", &self.collaborators);
        let vault = &self.collaborators.vault;

        vault.accrue_interest()?;
        let rate = vault.exchange_rate();
        let settlement = ledger::settle_withdrawal(&state.ledger.get(token), rate)?;
        debug!(%token, rate, payable = settlement.payable, "interest accrued");

        if settlement.payable == 0 {
            staged.commit();
            return Ok(0);
        }

        if !vault.redeem(caller, settlement.payable) {
            return Err(ExchangeError::transfer_failed("withdraw_interest: redeem to withdrawer"));
        }

        staged.commit();
        state.ledger.commit(*token, settlement.info);

        info!(%token, %caller, amount = settlement.payable, "interest withdrawn");
        Ok(settlement.payable)
    }

    /// Interest `withdraw_interest` would pay right now.
    ///
    /// Brings the vault rate up to date but leaves the ledger untouched.
    pub fn get_interest_payable(&self, token: &Address) -> ExchangeResult<u128> {
        let state = self.lock_state()?;
        let vault = &self.collaborators.vault;
        vault.accrue_interest()?;
        let accrued = ledger::accrue(&state.ledger.get(token), vault.exchange_rate())?;
        Ok(accrued.unclaimed_interest())
    }

    /// Interest earned since the last checkpoint, at the vault's stored rate
    pub fn pending_interest(&self, token: &Address) -> ExchangeResult<u128> {
        let state = self.lock_state()?;
        ledger::pending_interest(&state.ledger.get(token), self.collaborators.vault.exchange_rate())
    }

    /// Set who may withdraw `token`'s interest.
    ///
    /// Callable by the owner or by the token's current withdrawer.
    pub fn authorize_interest_withdrawer(
        &self,
        caller: &Address,
        token: &Address,
        new_withdrawer: &Address,
    ) -> ExchangeResult<()> {
        let mut state = self.lock_state()?;
        match state
            .withdrawers
            .authorize(caller, &self.config.owner, *token, *new_withdrawer)
        {
            Ok(previous) => {
                info!(%token, %caller, withdrawer = %new_withdrawer, previous = ?previous, "interest withdrawer authorized");
                Ok(())
            }
            Err(e) => {
                warn!(%token, %caller, "withdrawer authorization rejected");
                Err(e)
            }
        }
    }

    // ========================================================================
    // State Views
    // ========================================================================

    /// Escrow record of `token`
    pub fn token_exchange_info(&self, token: &Address) -> ExchangeResult<TokenExchangeInfo> {
        Ok(self.lock_state()?.ledger.get(token))
    }

    /// Authorized interest withdrawer of `token`
    pub fn interest_withdrawer(&self, token: &Address) -> ExchangeResult<Option<Address>> {
        Ok(self.lock_state()?.withdrawers.get(token))
    }

    /// Copy of the durable state
    pub fn snapshot(&self) -> ExchangeResult<ExchangeSnapshot> {
        let state = self.lock_state()?;
        Ok(ExchangeSnapshot {
            owner: self.config.owner,
            fee_recipient: self.config.fee_recipient,
            exchange_address: self.config.exchange_address,
            vault: self.collaborators.vault.address(),
            ledger: state.ledger.to_sorted(),
            withdrawers: state.withdrawers.to_sorted(),
        })
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn lock_state(&self) -> ExchangeResult<MutexGuard<'_, ExchangeState>> {
        self.state.lock().map_err(|_| ExchangeError::StatePoisoned)
    }

    /// Token → market → validated curve parameters
    fn resolve_params(&self, token: &Address) -> ExchangeResult<MarketParams> {
        let registry = &self.collaborators.registry;
        let market_id = registry
            .resolve_token(token)
            .ok_or(ExchangeError::UnknownToken { token: *token })?;
        let params = registry
            .resolve_market(market_id)
            .ok_or(ExchangeError::UnknownMarket { market_id })?;
        params.validate(market_id)?;
        Ok(params)
    }
}
