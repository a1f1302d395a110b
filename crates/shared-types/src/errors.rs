//! # Error Types
//!
//! Amount scaling errors shared by every crate.

use thiserror::Error;

/// Errors converting between decimal strings and smallest-unit integers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Input was empty or whitespace.
    #[error("Amount is empty")]
    Empty,

    /// A leading minus sign. Token amounts are never negative.
    #[error("Amount must not be negative: {0}")]
    Negative(String),

    /// A character other than an ASCII digit or a single decimal point.
    #[error("Invalid character in amount: {0}")]
    InvalidDigit(String),

    /// More fractional digits than the token's decimal count.
    #[error("Too many decimal places: {got} > {max}")]
    TooManyDecimals {
        /// Fractional digits supplied
        got: usize,
        /// Token decimal count
        max: u8,
    },

    /// Scaled value does not fit in 256 bits.
    #[error("Amount overflows 256 bits")]
    Overflow,

    /// Decimal count larger than a 256-bit integer can scale by.
    #[error("Decimal count out of range: {0}")]
    DecimalsOutOfRange(u8),
}
