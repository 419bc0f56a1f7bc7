//! # Stairway Simulator
//!
//! Replays a scripted scenario of buys, sells, vault accruals and interest
//! withdrawals against the exchange with in-memory collaborators, and
//! reports the resulting balances and escrow ledger.

pub mod config;
pub mod error;
pub mod runner;

pub use config::{create_example_config, SimConfig, Step, TokenAmount};
pub use error::{SimError, SimResult};
pub use runner::{Report, Simulation};
