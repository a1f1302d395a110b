//! # Ledger Sync Configuration
//!
//! Endpoint, chain and history settings. There is deliberately no request
//! timeout: an in-flight RPC or wallet request runs until it resolves.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::domain::{DEFAULT_HISTORY_WINDOW, NATIVE_DECIMALS};

/// Default JSON-RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Default chain id (Polygon Amoy testnet).
pub const DEFAULT_CHAIN_ID: u64 = 80002;

/// Default image used when no remote store is configured.
pub const DEFAULT_PLACEHOLDER_IMAGE: &str = "ipfs://placeholder/food-donation.png";

/// Ledger sync configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSyncConfig {
    /// Chain JSON-RPC endpoint.
    pub rpc_url: String,

    /// Chain the bindings were deployed to; sessions on other chains are
    /// rejected.
    pub chain_id: u64,

    /// Number of recent blocks scanned for history.
    pub history_block_window: u64,

    /// Decimal count of the native currency.
    pub native_decimals: u8,

    /// Image reference used when no remote store is configured.
    pub placeholder_image_uri: String,

    /// Pinning endpoint for NFT images. `None` means no remote store.
    pub image_store_url: Option<String>,

    /// JSON bindings document.
    pub bindings_path: PathBuf,
}

impl Default for LedgerSyncConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            history_block_window: DEFAULT_HISTORY_WINDOW,
            native_decimals: NATIVE_DECIMALS,
            placeholder_image_uri: DEFAULT_PLACEHOLDER_IMAGE.to_string(),
            image_store_url: None,
            bindings_path: PathBuf::from("contracts/bindings.json"),
        }
    }
}

impl LedgerSyncConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LEDGER_RPC_URL`: JSON-RPC endpoint (default: http://127.0.0.1:8545)
    /// - `LEDGER_CHAIN_ID`: expected chain id (default: 80002)
    /// - `LEDGER_HISTORY_WINDOW`: history window in blocks (default: 10000)
    /// - `LEDGER_PLACEHOLDER_IMAGE`: placeholder image URI
    /// - `LEDGER_IMAGE_STORE_URL`: image pinning endpoint (default: unset)
    /// - `LEDGER_BINDINGS`: bindings document path (default: contracts/bindings.json)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            rpc_url: env::var("LEDGER_RPC_URL").unwrap_or(defaults.rpc_url),

            chain_id: env::var("LEDGER_CHAIN_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.chain_id),

            history_block_window: env::var("LEDGER_HISTORY_WINDOW")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|blocks| *blocks > 0)
                .unwrap_or(defaults.history_block_window),

            native_decimals: defaults.native_decimals,

            placeholder_image_uri: env::var("LEDGER_PLACEHOLDER_IMAGE")
                .unwrap_or(defaults.placeholder_image_uri),

            image_store_url: env::var("LEDGER_IMAGE_STORE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),

            bindings_path: env::var("LEDGER_BINDINGS")
                .map(PathBuf::from)
                .unwrap_or(defaults.bindings_path),
        }
    }

    /// Create a config for testing (local chain, small window).
    pub fn for_testing() -> Self {
        Self {
            chain_id: 31337,
            history_block_window: 100,
            ..Self::default()
        }
    }
}
