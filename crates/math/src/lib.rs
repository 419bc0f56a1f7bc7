/// Mathematical utilities for the Stairway exchange
///
/// This crate provides overflow-checked integer arithmetic, 18-decimal
/// fixed-point helpers, the staircase bonding-curve integral and the
/// trading-fee quotes built on top of it. Every division floors.

pub mod curve;
pub mod fee;
pub mod safe;
pub mod wad;

// Re-export commonly used functions
pub use curve::*;
pub use fee::*;
pub use safe::*;
pub use wad::*;

pub use ethnum::U256;
