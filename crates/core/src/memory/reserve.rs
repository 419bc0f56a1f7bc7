use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use stairway_types::{Address, ExchangeError, ExchangeResult};
use tracing::debug;

use super::{lock, Journaled};
use crate::ports::{Checkpoint, ReserveAsset, Revertible};

#[derive(Debug, Clone, Default)]
struct Balances {
    balances: HashMap<Address, u128>,
    allowances: HashMap<(Address, Address), u128>,
}

impl Balances {
    fn balance(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    fn move_funds(&mut self, from: &Address, to: &Address, amount: u128) -> bool {
        let from_balance = self.balance(from);
        if from_balance < amount {
            return false;
        }
        if from == to {
            return true;
        }
        let Some(to_balance) = self.balance(to).checked_add(amount) else {
            return false;
        };

        self.balances.insert(*from, from_balance - amount);
        self.balances.insert(*to, to_balance);
        true
    }
}

/// Reserve asset with balances and allowances.
///
/// Accounts can be frozen to make every transfer into them fail, which is
/// how tests exercise rollback of a half-finished settlement.
#[derive(Debug)]
pub struct MemoryReserve {
    state: Mutex<Journaled<Balances>>,
    frozen: Mutex<HashSet<Address>>,
}

impl Default for MemoryReserve {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryReserve {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Journaled::new(Balances::default())),
            frozen: Mutex::new(HashSet::new()),
        }
    }

    /// Credit `amount` out of thin air
    pub fn mint(&self, holder: &Address, amount: u128) -> ExchangeResult<()> {
        let mut state = lock(&self.state);
        let balances = &mut state.get_mut().balances;
        let entry = balances.entry(*holder).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| ExchangeError::overflow("reserve mint"))?;
        Ok(())
    }

    /// Let `spender` move up to `amount` of `owner`'s balance
    pub fn approve(&self, owner: &Address, spender: &Address, amount: u128) {
        let mut state = lock(&self.state);
        state.get_mut().allowances.insert((*owner, *spender), amount);
    }

    /// Reject every transfer into `holder`
    pub fn freeze(&self, holder: &Address) {
        lock(&self.frozen).insert(*holder);
    }

    pub fn unfreeze(&self, holder: &Address) {
        lock(&self.frozen).remove(holder);
    }

    /// Sum of every balance
    pub fn total_supply(&self) -> u128 {
        let state = lock(&self.state);
        state.get().balances.values().fold(0u128, |acc, b| acc.saturating_add(*b))
    }

    fn is_frozen(&self, holder: &Address) -> bool {
        lock(&self.frozen).contains(holder)
    }
}

impl ReserveAsset for MemoryReserve {
    fn balance_of(&self, holder: &Address) -> u128 {
        lock(&self.state).get().balance(holder)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        let state = lock(&self.state);
        state.get().allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    fn transfer(&self, from: &Address, to: &Address, amount: u128) -> bool {
        if self.is_frozen(to) {
            debug!(%to, amount, "transfer into frozen account rejected");
            return false;
        }
        lock(&self.state).get_mut().move_funds(from, to, amount)
    }

    fn transfer_from(&self, spender: &Address, from: &Address, to: &Address, amount: u128) -> bool {
        if self.is_frozen(to) {
            debug!(%to, amount, "transfer into frozen account rejected");
            return false;
        }

        let mut state = lock(&self.state);
        let balances = state.get_mut();
        let key = (*from, *spender);
        let approved = balances.allowances.get(&key).copied().unwrap_or(0);
        if approved < amount {
            return false;
        }
        if !balances.move_funds(from, to, amount) {
            return false;
        }
        balances.allowances.insert(key, approved - amount);
        true
    }
}

impl Revertible for MemoryReserve {
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
