/// Escrow ledger records

use serde::{Deserialize, Serialize};

/// Per-token escrow accounting.
///
/// Tracks the reserve principal attributed to a token's trades, the vault
/// shares backing it and the interest recognized and paid out so far.
/// Invariant: `generated_interest >= withdrawn_interest`, and both only grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenExchangeInfo {
    /// Reserve principal attributed to this token
    pub reserve_in_token: u128,
    /// Vault shares attributed to this token
    pub interest_shares: u128,
    /// Interest recognized as of the last accrual checkpoint
    pub generated_interest: u128,
    /// Interest already paid to the authorized withdrawer
    pub withdrawn_interest: u128,
}

impl TokenExchangeInfo {
    /// Recognized interest not yet paid out
    pub fn unclaimed_interest(&self) -> u128 {
        self.generated_interest.saturating_sub(self.withdrawn_interest)
    }

    /// Reserve value the ledger already accounts for: principal plus
    /// recognized but unpaid interest
    pub fn accounted_value(&self) -> Option<u128> {
        self.reserve_in_token.checked_add(self.unclaimed_interest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_zeroed() {
        let info = TokenExchangeInfo::default();
        assert_eq!(info.unclaimed_interest(), 0);
        assert_eq!(info.accounted_value(), Some(0));
    }

    #[test]
    fn test_accounted_value() {
        let info = TokenExchangeInfo {
            reserve_in_token: 1_000,
            interest_shares: 900,
            generated_interest: 50,
            withdrawn_interest: 20,
        };
        assert_eq!(info.unclaimed_interest(), 30);
        assert_eq!(info.accounted_value(), Some(1_030));
    }
}
