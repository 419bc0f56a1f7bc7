/// Shared types for the Stairway exchange
///
/// This crate provides the identifiers, market parameters, escrow ledger
/// records and error taxonomy used by the curve math, the exchange core
/// and the simulator.

pub mod address;
pub mod constants;
pub mod errors;
pub mod escrow;
pub mod market;
pub mod receipts;

// Re-export all public types
pub use address::*;
pub use constants::*;
pub use errors::*;
pub use escrow::*;
pub use market::*;
pub use receipts::*;
