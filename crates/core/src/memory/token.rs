use std::collections::HashMap;
use std::sync::Mutex;

use stairway_types::{Address, ExchangeError, ExchangeResult};

use super::{lock, Journaled};
use crate::ports::{Checkpoint, Revertible, TokenLedger};

#[derive(Debug, Clone, Default)]
struct Supplies {
    supplies: HashMap<Address, u128>,
    balances: HashMap<(Address, Address), u128>,
}

/// Token ledger for any number of market tokens
#[derive(Debug)]
pub struct MemoryToken {
    state: Mutex<Journaled<Supplies>>,
}

impl Default for MemoryToken {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryToken {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Journaled::new(Supplies::default())),
        }
    }
}

impl TokenLedger for MemoryToken {
    fn total_supply(&self, token: &Address) -> u128 {
        lock(&self.state).get().supplies.get(token).copied().unwrap_or(0)
    }

    fn balance_of(&self, token: &Address, holder: &Address) -> u128 {
        let state = lock(&self.state);
        state.get().balances.get(&(*token, *holder)).copied().unwrap_or(0)
    }

    fn mint(&self, token: &Address, recipient: &Address, amount: u128) -> ExchangeResult<()> {
        let mut state = lock(&self.state);
        let current = state.get_mut();

        let supply = current.supplies.get(token).copied().unwrap_or(0);
        let balance = current.balances.get(&(*token, *recipient)).copied().unwrap_or(0);
        let overflow = || ExchangeError::overflow("token mint");

        current.supplies.insert(*token, supply.checked_add(amount).ok_or_else(overflow)?);
        current
            .balances
            .insert((*token, *recipient), balance.checked_add(amount).ok_or_else(overflow)?);
        Ok(())
    }

    fn burn(&self, token: &Address, holder: &Address, amount: u128) -> ExchangeResult<()> {
        let mut state = lock(&self.state);
        let current = state.get_mut();

        let balance = current.balances.get(&(*token, *holder)).copied().unwrap_or(0);
        if balance < amount {
            return Err(ExchangeError::InsufficientBalance {
                balance,
                required: amount,
            });
        }
        let supply = current.supplies.get(token).copied().unwrap_or(0);

        current.balances.insert((*token, *holder), balance - amount);
        current.supplies.insert(*token, supply.saturating_sub(amount));
        Ok(())
    }
}

impl Revertible for MemoryToken {
    fn checkpoint(&self) -> Checkpoint {
        lock(&self.state).checkpoint()
    }

    fn revert_to(&self, checkpoint: Checkpoint) {
        lock(&self.state).revert_to(checkpoint)
    }

    fn release(&self, checkpoint: Checkpoint) {
        lock(&self.state).release(checkpoint)
    }
}
