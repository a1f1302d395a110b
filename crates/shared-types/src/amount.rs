//! # Token Amounts
//!
//! Exact conversion between smallest-unit integers and decimal strings.
//!
//! Scaling is pure integer arithmetic on `U256`; no value ever passes
//! through `f64`, so `parse_units(&format_units(a, d), d) == a` for every
//! `a` and every supported `d`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::entities::U256;
use crate::errors::AmountError;

/// Largest decimal count a 256-bit integer can be scaled by (10^77 < 2^256).
pub const MAX_DECIMALS: u8 = 77;

/// An integer amount in a token's smallest unit plus its decimal count.
///
/// Non-negative by construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenAmount {
    raw: U256,
    decimals: u8,
}

impl TokenAmount {
    /// Wraps a raw smallest-unit value.
    pub fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    /// Zero at the given scale.
    pub fn zero(decimals: u8) -> Self {
        Self::new(U256::ZERO, decimals)
    }

    /// Parses a user-entered decimal string at the given scale.
    pub fn parse(input: &str, decimals: u8) -> Result<Self, AmountError> {
        parse_units(input, decimals).map(|raw| Self::new(raw, decimals))
    }

    /// Raw smallest-unit value.
    pub fn raw(&self) -> U256 {
        self.raw
    }

    /// Declared decimal count.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// True when the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// Compares two amounts, only when they share a scale.
    pub fn cmp_same_scale(&self, other: &Self) -> Option<Ordering> {
        (self.decimals == other.decimals).then(|| self.raw.cmp(&other.raw))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_units(self.raw, self.decimals))
    }
}

/// Renders `raw` as a decimal string with `decimals` fractional digits.
///
/// Trailing fractional zeros are trimmed, and the point is dropped for
/// whole amounts.
pub fn format_units(raw: U256, decimals: u8) -> String {
    let digits = raw.to_string();
    let scale = decimals as usize;
    if scale == 0 {
        return digits;
    }

    let padded = if digits.len() <= scale {
        format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (whole, frac) = padded.split_at(padded.len() - scale);
    let frac = frac.trim_end_matches('0');

    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{frac}")
    }
}

/// Scales a decimal string to its smallest-unit integer.
pub fn parse_units(input: &str, decimals: u8) -> Result<U256, AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::DecimalsOutOfRange(decimals));
    }

    let (whole, frac) = split_decimal(input)?;

    let scale = decimals as usize;
    if frac.len() > scale {
        return Err(AmountError::TooManyDecimals {
            got: frac.len(),
            max: decimals,
        });
    }

    let whole_value = decimal_digits(whole)?;
    let scaled = whole_value
        .checked_mul(pow10(decimals))
        .ok_or(AmountError::Overflow)?;

    let frac_value = decimal_digits(&format!("{frac:0<scale$}"))?;
    scaled.checked_add(frac_value).ok_or(AmountError::Overflow)
}

/// `10^decimals`, the scale factor of a token with `decimals` places.
///
/// Callers keep `decimals <= MAX_DECIMALS`; larger exponents wrap.
pub fn pow10(decimals: u8) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}

/// Syntax check of a decimal string, independent of any token's scale.
///
/// Returns whether the value is non-zero. Lets callers reject bad input
/// before they know (or fetch) the decimal count.
pub fn decimal_is_nonzero(input: &str) -> Result<bool, AmountError> {
    let (whole, frac) = split_decimal(input)?;
    Ok(whole.bytes().chain(frac.bytes()).any(|b| b != b'0'))
}

/// Splits into whole and fractional digit runs, rejecting signs and junk.
fn split_decimal(input: &str) -> Result<(&str, &str), AmountError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(AmountError::Empty);
    }
    if s.starts_with('-') {
        return Err(AmountError::Negative(s.to_string()));
    }

    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
        return Err(AmountError::InvalidDigit(s.to_string()));
    }
    Ok((whole, frac))
}

/// Digit string to `U256`; empty means zero. Callers validate the digits.
fn decimal_digits(digits: &str) -> Result<U256, AmountError> {
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 10).map_err(|_| AmountError::Overflow)
}
