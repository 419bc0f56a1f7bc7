use serde::{Deserialize, Serialize};
use stairway_types::{Address, ExchangeError, ExchangeResult};

/// How trades feed the escrow ledger.
///
/// `Tracked` attributes each buy's principal and the vault shares it
/// minted to the token, and removes what a sell redeems. `Deferred` leaves
/// the ledger untouched by trades, so only withdrawals change it.
///
/// `Tracked` is the default until product owners confirm how trade
/// principal should reconcile with escrow; treat it as provisional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowAttribution {
    #[default]
    Tracked,
    Deferred,
}

/// Process-wide settings, fixed when the exchange is initialized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// May rotate any token's interest withdrawer
    pub owner: Address,

    /// Receives every trading fee
    pub fee_recipient: Address,

    /// The exchange's own custody account; buyers approve it as spender
    pub exchange_address: Address,

    /// Escrow attribution policy for trades
    #[serde(default)]
    pub escrow_attribution: EscrowAttribution,
}

impl ExchangeConfig {
    /// Validate configuration
    pub fn validate(&self) -> ExchangeResult<()> {
        if self.owner.is_default() {
            return Err(ExchangeError::invalid_configuration("owner", "must not be the default address"));
        }

        if self.fee_recipient.is_default() {
            return Err(ExchangeError::invalid_configuration(
                "fee_recipient",
                "must not be the default address",
            ));
        }

        if self.exchange_address.is_default() {
            return Err(ExchangeError::invalid_configuration(
                "exchange_address",
                "must not be the default address",
            ));
        }

        Ok(())
    }
}
