use std::sync::{Arc, Mutex};

use stairway_math::{mul_div, shares_for_value, value_of_shares, Rounding};
use stairway_types::{Address, ExchangeError, ExchangeResult, WAD};
use tracing::debug;

use super::{lock, Journaled};
use crate::ports::{Checkpoint, ReserveAsset, Revertible, YieldVault};

#[derive(Debug, Clone, Copy)]
struct Position {
    exchange_rate: u128,
    total_shares: u128,
}

/// Share-based yield vault holding reserve in a [`MemoryReserve`] account.
///
/// Investing mints shares rounded down and redeeming burns shares rounded
/// up, so the vault's reserve balance always covers its shares. A redeem
/// whose rounded-up burn exceeds the outstanding shares takes the rest of
/// them as long as the rounded-down burn fits, so the final holder can
/// always exit. Each
/// accrual multiplies the rate by `1 + growth` and mints the matching
/// reserve into the vault account.
///
/// [`MemoryReserve`]: super::MemoryReserve
#[derive(Debug)]
pub struct MemoryVault {
    address: Address,
    reserve: Arc<super::MemoryReserve>,
    growth_per_accrual: u128,
    position: Mutex<Journaled<Position>>,
}

impl MemoryVault {
    pub fn new(address: Address, reserve: Arc<super::MemoryReserve>, initial_rate: u128) -> ExchangeResult<Self> {
        if initial_rate == 0 {
            return Err(ExchangeError::invalid_configuration(
                "initial_exchange_rate",
                "must be greater than zero",
            ));
        }

        Ok(Self {
            address,
            reserve,
            growth_per_accrual: 0,
            position: Mutex::new(Journaled::new(Position {
                exchange_rate: initial_rate,
                total_shares: 0,
            })),
        })
    }

    /// Rate growth per accrual, as a wad fraction
    pub fn with_growth(mut self, growth_per_accrual: u128) -> Self {
        self.growth_per_accrual = growth_per_accrual;
        self
    }

    /// Raise the exchange rate, funding the added share value
    pub fn set_exchange_rate(&self, new_rate: u128) -> ExchangeResult<()> {
        let mut position = lock(&self.position);
        let current = *position.get();
        if new_rate < current.exchange_rate {
            return Err(ExchangeError::invalid_configuration(
                "exchange_rate",
                "vault rate cannot decrease",
            ));
        }

        self.fund_rate_change(&current, new_rate)?;
        position.get_mut().exchange_rate = new_rate;
        Ok(())
    }

    /// Outstanding shares across all depositors
    pub fn total_shares(&self) -> u128 {
        lock(&self.position).get().total_shares
    }

    fn fund_rate_change(&self, current: &Position, new_rate: u128) -> ExchangeResult<()> {
        let before = value_of_shares(current.total_shares, current.exchange_rate)?;
        let after = value_of_shares(current.total_shares, new_rate)?;
        let backing = after.saturating_sub(before);
        if backing > 0 {
            self.reserve.mint(&self.address, backing)?;
        }
        Ok(())
    }
}

impl YieldVault for MemoryVault {
    fn address(&self) -> Address {
        self.address
    }

    fn invest(&self, amount: u128) -> ExchangeResult<()> {
        let mut position = lock(&self.position);
        let current = position.get_mut();

        let minted = shares_for_value(amount, current.exchange_rate, Rounding::Down)?;
        let total_shares = current
            .total_shares
            .checked_add(minted)
            .ok_or_else(|| ExchangeError::overflow("vault invest"))?;

        // The deposit must already sit in the vault account
        let held = self.reserve.balance_of(&self.address);
        if value_of_shares(total_shares, current.exchange_rate)? > held {
            return Err(ExchangeError::collaborator("vault", "deposit not received"));
        }

        current.total_shares = total_shares;
        debug!(amount, minted, "vault invested");
        Ok(())
    }

    fn redeem(&self, recipient: &Address, amount: u128) -> bool {
        let mut position = lock(&self.position);
        let current = position.get_mut();

        let Ok(mut burned) = shares_for_value(amount, current.exchange_rate, Rounding::Up) else {
            return false;
        };
        if burned > current.total_shares {
            let Ok(floor) = shares_for_value(amount, current.exchange_rate, Rounding::Down) else {
                return false;
            };
            if floor > current.total_shares {
                debug!(amount, burned, available = current.total_shares, "vault redeem exceeds shares");
                return false;
            }
            burned = current.total_shares;
        }
        if !self.reserve.transfer(&self.address, recipient, amount) {
            return false;
        }

        current.total_shares -= burned;
        true
    }

    fn accrue_interest(&self) -> ExchangeResult<()> {
        if self.growth_per_accrual == 0 {
            return Ok(());
        }

        let mut position = lock(&self.position);
        let current = *position.get();
        let factor = WAD
            .checked_add(self.growth_per_accrual)
            .ok_or_else(|| ExchangeError::overflow("vault accrual"))?;
        let new_rate = mul_div(current.exchange_rate, factor, WAD, Rounding::Down)?;

        self.fund_rate_change(&current, new_rate)?;
        position.get_mut().exchange_rate = new_rate;
        debug!(rate = new_rate, "vault accrued");
        Ok(())
    }

    fn exchange_rate(&self) -> u128 {
        lock(&self.position).get().exchange_rate
    }
}

impl Revertible for MemoryVault {
    fn checkpoint(&self) -> Checkpoint {
        lock(&self.position).checkpoint()
    }

    fn revert_to(&self, checkpoint: Checkpoint) {
        lock(&self.position).revert_to(checkpoint)
    }

    fn release(&self, checkpoint: Checkpoint) {
        lock(&self.position).release(checkpoint)
    }
}
