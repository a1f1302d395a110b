//! # Core Ledger Entities
//!
//! Identity types shared by every crate that talks to the external ledger.
//!
//! ## Clusters
//!
//! - **Identity**: `Address`, `TxHash` (alloy primitives)
//! - **Session**: `ChainSession`

use serde::{Deserialize, Serialize};

// EVM primitives come from alloy so ABI, RPC and domain code share one set.
pub use alloy_primitives::{Address, B256, U256};

/// A 32-byte transaction hash (Keccak-256).
pub type TxHash = B256;

// =============================================================================
// SESSION
// =============================================================================

/// The connected-wallet identity used to authorize writes.
///
/// At most one is active per client. It is created by the wallet adapter on
/// connect and dropped on disconnect; this crate only ever reads snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSession {
    /// Connected account.
    pub address: Address,
    /// EIP-155 chain id the wallet is currently on.
    pub chain_id: u64,
    /// Whether the wallet reports the session as live.
    pub connected: bool,
}

impl ChainSession {
    /// A live session for `address` on `chain_id`.
    pub fn connected(address: Address, chain_id: u64) -> Self {
        Self {
            address,
            chain_id,
            connected: true,
        }
    }

    /// Returns the session only if it is live.
    pub fn active(self) -> Option<Self> {
        self.connected.then_some(self)
    }
}
