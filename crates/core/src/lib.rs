//! # Stairway Core - Exchange Engine
//!
//! Settles buys and sells of market tokens against a reserve asset along a
//! staircase bonding curve, and keeps the per-token escrow ledger of the
//! interest the reserve earns in a yield vault. It provides:
//!
//! - Collaborator ports for the registry, token, vault and reserve asset
//! - The escrow ledger and its accrual rules
//! - Staged settlement that rolls collaborators back on failure
//! - The `TokenExchange` entry points
//! - In-memory collaborators for simulation and tests

pub mod authority;
pub mod config;
pub mod exchange;
pub mod ledger;
pub mod memory;
pub mod ports;
pub mod settlement;

// Re-export commonly used items
pub use authority::WithdrawerRegistry;
pub use config::{EscrowAttribution, ExchangeConfig};
pub use exchange::{ExchangeSnapshot, TokenExchange};
pub use ledger::EscrowLedger;
pub use ports::*;
