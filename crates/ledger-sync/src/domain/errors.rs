//! # Domain Errors
//!
//! Error taxonomy for the ledger sync layer.
//!
//! | Variant | Raised when | Blocks submission? |
//! |---------|-------------|--------------------|
//! | `NotConnected` | no live wallet session | yes |
//! | `WrongChain` | wallet is on another chain | yes |
//! | `Validation` | input rejected client-side | yes, before any network call |
//! | `Network` | RPC unreachable, failed or malformed | surfaced, not retried |
//! | `ContractRevert` | chain or wallet rejected the call | surfaced, not retried |
//! | `PartialFetch` | one side of a two-sided log query failed | no, partial data returned |

use std::fmt;

use serde::{Deserialize, Serialize};
use shared_types::AmountError;
use thiserror::Error;

use crate::contracts::ContractRole;

/// Which half of a two-sided log query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuerySide {
    /// Logs where `from == address`.
    Sent,
    /// Logs where `to == address`.
    Received,
}

impl fmt::Display for QuerySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuerySide::Sent => f.write_str("sent"),
            QuerySide::Received => f.write_str("received"),
        }
    }
}

/// Ledger sync error types.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// No active wallet session.
    #[error("Wallet not connected")]
    NotConnected,

    /// Session chain differs from the chain the bindings target.
    #[error("Wallet is on chain {actual}, expected chain {expected}")]
    WrongChain {
        /// Configured chain id
        expected: u64,
        /// Chain id reported by the wallet
        actual: u64,
    },

    /// RPC unreachable, failed, or returned data that could not be decoded.
    #[error("Network error: {0}")]
    Network(String),

    /// The chain (or the wallet on its behalf) rejected the call.
    #[error("Contract reverted: {}", .reason.as_deref().unwrap_or("no reason given"))]
    ContractRevert {
        /// Revert reason, when the node returned one
        reason: Option<String>,
    },

    /// Client-side input validation failed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// One side of a two-part log query failed; the other side's data was kept.
    #[error("Partial fetch: {side} query failed: {reason}")]
    PartialFetch {
        /// Failed side
        side: QuerySide,
        /// Underlying failure
        reason: String,
    },

    /// Contract binding rejected at startup.
    #[error("Invalid contract binding: {0}")]
    Binding(#[from] BindingError),
}

impl LedgerError {
    /// Stable machine-readable tag for the UI layer.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::NotConnected => "not_connected",
            LedgerError::WrongChain { .. } => "wrong_chain",
            LedgerError::Network(_) => "network",
            LedgerError::ContractRevert { .. } => "contract_revert",
            LedgerError::Validation(_) => "validation",
            LedgerError::PartialFetch { .. } => "partial_fetch",
            LedgerError::Binding(_) => "binding",
        }
    }

    /// Shorthand for a revert with a reason string.
    pub fn revert(reason: impl Into<String>) -> Self {
        LedgerError::ContractRevert {
            reason: Some(reason.into()),
        }
    }
}

impl From<AmountError> for LedgerError {
    fn from(err: AmountError) -> Self {
        LedgerError::Validation(err.to_string())
    }
}

/// Errors validating contract bindings at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// Bindings document could not be read.
    #[error("Cannot read bindings from {path}: {reason}")]
    Io {
        /// File path
        path: String,
        /// OS error
        reason: String,
    },

    /// Bindings document is not the expected JSON shape.
    #[error("Malformed bindings document: {0}")]
    Malformed(String),

    /// Address field did not parse.
    #[error("Invalid address for {role}: {reason}")]
    InvalidAddress {
        /// Contract concerned
        role: ContractRole,
        /// Parse failure
        reason: String,
    },

    /// Address is the zero address.
    #[error("Zero address bound for {0}")]
    ZeroAddress(ContractRole),

    /// Two roles bound to the same contract.
    #[error("{first} and {second} are bound to the same address")]
    DuplicateAddress {
        /// First role
        first: ContractRole,
        /// Second role
        second: ContractRole,
    },

    /// ABI does not declare a function the layer calls.
    #[error("{role} ABI does not declare function {signature}")]
    MissingFunction {
        /// Contract concerned
        role: ContractRole,
        /// Canonical signature
        signature: String,
    },

    /// ABI does not declare an event the layer indexes.
    #[error("{role} ABI does not declare event {signature}")]
    MissingEvent {
        /// Contract concerned
        role: ContractRole,
        /// Canonical signature
        signature: String,
    },
}
