//! Authorized interest withdrawers per token

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use stairway_types::{Address, ExchangeError, ExchangeResult};

/// Token identity → address allowed to claim that token's interest
#[derive(Debug, Default, Clone, Serialize)]
pub struct WithdrawerRegistry {
    withdrawers: HashMap<Address, Address>,
}

impl WithdrawerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current withdrawer of `token`, if any
    pub fn get(&self, token: &Address) -> Option<Address> {
        self.withdrawers.get(token).copied()
    }

    /// Whether `caller` may withdraw `token`'s interest
    pub fn is_withdrawer(&self, token: &Address, caller: &Address) -> bool {
        self.withdrawers.get(token) == Some(caller)
    }

    /// Overwrite the withdrawer of `token`.
    ///
    /// Only `owner` or the current withdrawer may do this. Returns the
    /// previous withdrawer.
    pub fn authorize(
        &mut self,
        caller: &Address,
        owner: &Address,
        token: Address,
        new_withdrawer: Address,
    ) -> ExchangeResult<Option<Address>> {
        if caller != owner && !self.is_withdrawer(&token, caller) {
            return Err(ExchangeError::NotAuthorized { caller: *caller });
        }
        Ok(self.withdrawers.insert(token, new_withdrawer))
    }

    /// Assignments ordered by token identity
    pub fn to_sorted(&self) -> BTreeMap<Address, Address> {
        self.withdrawers.iter().map(|(k, v)| (*k, *v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: Address = Address::repeat_byte(1);
    const TOKEN: Address = Address::repeat_byte(10);
    const ALICE: Address = Address::repeat_byte(20);
    const BOB: Address = Address::repeat_byte(21);

    #[test]
    fn test_owner_can_assign() {
        let mut registry = WithdrawerRegistry::new();
        assert_eq!(registry.authorize(&OWNER, &OWNER, TOKEN, ALICE).unwrap(), None);
        assert!(registry.is_withdrawer(&TOKEN, &ALICE));
    }

    #[test]
    fn test_withdrawer_can_rotate_itself() {
        let mut registry = WithdrawerRegistry::new();
        registry.authorize(&OWNER, &OWNER, TOKEN, ALICE).unwrap();

        let previous = registry.authorize(&ALICE, &OWNER, TOKEN, BOB).unwrap();
        assert_eq!(previous, Some(ALICE));
        assert_eq!(registry.get(&TOKEN), Some(BOB));
        assert!(!registry.is_withdrawer(&TOKEN, &ALICE));
    }

    #[test]
    fn test_stranger_is_rejected() {
        let mut registry = WithdrawerRegistry::new();
        registry.authorize(&OWNER, &OWNER, TOKEN, ALICE).unwrap();

        let result = registry.authorize(&BOB, &OWNER, TOKEN, BOB);
        assert_eq!(result, Err(ExchangeError::NotAuthorized { caller: BOB }));
        assert_eq!(registry.get(&TOKEN), Some(ALICE));
    }
}
