use thiserror::Error;

use crate::address::Address;
use crate::market::MarketId;

// ============================================================================
// Main Error Enum
// ============================================================================

/// Every way an exchange call can abort.
///
/// Any of these aborts the whole call; no partial state change persists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    // ========================================================================
    // Lookup Errors
    // ========================================================================

    /// Token identity is not registered with any market
    #[error("Unknown token: {token}")]
    UnknownToken { token: Address },

    /// Market referenced by a token does not exist
    #[error("Unknown market: {market_id}")]
    UnknownMarket { market_id: MarketId },

    /// Registry returned parameters that break the curve invariants
    #[error("Invalid parameters for market {market_id}: {reason}")]
    InvalidMarketParams { market_id: MarketId, reason: String },

    // ========================================================================
    // Trade Errors
    // ========================================================================

    /// Quoted cost or price moved past the caller's bound
    #[error("Slippage exceeded: quoted {quoted}, bound {bound}")]
    SlippageExceeded { quoted: u128, bound: u128 },

    /// Caller has not approved enough reserve to the exchange
    #[error("Insufficient allowance: approved {approved}, required {required}")]
    InsufficientAllowance { approved: u128, required: u128 },

    /// Caller holds fewer tokens than it tries to sell
    #[error("Insufficient balance: holds {balance}, required {required}")]
    InsufficientBalance { balance: u128, required: u128 },

    /// Sell amount is larger than the outstanding supply
    #[error("Amount {amount} exceeds supply {supply}")]
    AmountExceedsSupply { amount: u128, supply: u128 },

    /// Trades must move a non-zero amount
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    // ========================================================================
    // Collaborator Errors
    // ========================================================================

    /// A reserve transfer or vault redemption reported failure
    #[error("Transfer failed in '{operation}'")]
    TransferFailed { operation: String },

    /// A collaborator rejected a call
    #[error("Collaborator '{component}' failed: {reason}")]
    Collaborator { component: String, reason: String },

    // ========================================================================
    // Authorization Errors
    // ========================================================================

    /// Caller is neither the owner nor the authorized withdrawer
    #[error("Not authorized: {caller}")]
    NotAuthorized { caller: Address },

    // ========================================================================
    // Math Errors
    // ========================================================================

    /// Fixed-point computation exceeded the representable range
    #[error("Arithmetic overflow in '{operation}'")]
    ArithmeticOverflow { operation: String },

    /// Division by a zero denominator
    #[error("Division by zero in '{operation}'")]
    DivisionByZero { operation: String },

    // ========================================================================
    // Configuration and State Errors
    // ========================================================================

    /// Configuration value rejected during validation
    #[error("Invalid configuration '{parameter}': {reason}")]
    InvalidConfiguration { parameter: String, reason: String },

    /// A thread panicked while holding the exchange state
    #[error("Exchange state lock poisoned")]
    StatePoisoned,
}

impl ExchangeError {
    /// Create an arithmetic overflow error for an operation
    pub fn overflow(operation: &str) -> Self {
        Self::ArithmeticOverflow {
            operation: operation.to_string(),
        }
    }

    /// Create a division by zero error for an operation
    pub fn division_by_zero(operation: &str) -> Self {
        Self::DivisionByZero {
            operation: operation.to_string(),
        }
    }

    /// Create a failed transfer error
    pub fn transfer_failed(operation: &str) -> Self {
        Self::TransferFailed {
            operation: operation.to_string(),
        }
    }

    /// Create a collaborator failure
    pub fn collaborator(component: &str, reason: &str) -> Self {
        Self::Collaborator {
            component: component.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid market parameter error
    pub fn invalid_market(market_id: MarketId, reason: &str) -> Self {
        Self::InvalidMarketParams {
            market_id,
            reason: reason.to_string(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_configuration(parameter: &str, reason: &str) -> Self {
        Self::InvalidConfiguration {
            parameter: parameter.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias using the shared error type
pub type ExchangeResult<T> = std::result::Result<T, ExchangeError>;
