//! # Shared Types Crate
//!
//! Primitives shared by every crate that talks to the external ledger.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Address`, `TxHash` and `U256` are the alloy
//!   primitives, re-exported once here next to `TokenAmount` and reused by
//!   the sync layer, the CLI and the tests.
//! - **Exact Amounts**: token values are `U256` in the smallest unit; decimal
//!   strings are produced and parsed with integer arithmetic only.

pub mod amount;
pub mod entities;
pub mod errors;

pub use amount::{
    decimal_is_nonzero, format_units, parse_units, pow10, TokenAmount, MAX_DECIMALS,
};
pub use entities::*;
pub use errors::*;
