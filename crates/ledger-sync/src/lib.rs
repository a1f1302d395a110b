//! # Ledger Sync
//!
//! Ledger synchronization and contract orchestration for the food-donation
//! marketplace.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! The marketplace keeps its tokens, NGO registry and achievement NFTs on an
//! external EVM chain. This crate is the only place the client talks to it:
//! - `BalanceReader` answers read-only queries (balances, price, registry)
//! - `ContractWriter` validates and submits state-changing calls through the
//!   connected wallet and records them optimistically
//! - `EventLogIndexer` rebuilds confirmed history and NFT ownership from
//!   `Transfer` logs
//! - `LocalStateCache` merges both into the feed the UI renders
//!
//! ## Consistency Rules
//!
//! | Rule | Description |
//! |------|-------------|
//! | Exact amounts | Token values are `U256` scaled by the token's declared decimals |
//! | Session gate | Every chain action requires a live session on the configured chain |
//! | Event identity | A confirmed record is identified by `(tx hash, log index)` and appears once |
//! | Feed order | Pending first, then newest block first |
//! | No retries | Failures surface once; the caller decides whether to retry |
//!
//! ## Module Structure
//!
//! ```text
//! ledger-sync/
//! ├── domain/          # Records, value objects, errors, invariants
//! ├── contracts/       # Solidity interfaces and validated contract bindings
//! ├── algorithms/      # Log decoding, history merge, NFT ownership replay
//! ├── ports/           # API trait (inbound) + chain/wallet/image traits (outbound)
//! ├── application/     # Reader, writer, indexer, cache and LedgerService
//! ├── adapters/        # alloy provider chain client and wallet, HTTP image store
//! └── config.rs        # LedgerSyncConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod contracts;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{HttpImageStore, JsonRpcChainClient, RpcWalletSession};
pub use algorithms::{build_history, current_holdings, merge_events, sort_history};
pub use application::{
    BalanceReader, ContractWriter, EventLogIndexer, LedgerService, LocalStateCache, OwnedNfts,
    TransferHistory,
};
pub use config::LedgerSyncConfig;
pub use contracts::{ContractBinding, ContractBindings, ContractRole};
pub use domain::{
    invariant_history_ordered, invariant_unique_events, BalanceSnapshot, Direction, DonationId,
    EventKey, HistoryWindow, ImageFile, ImageRef, LedgerError, NftMetadata, NftRecord, NftStatus,
    PriceQuote, QuerySide, RecordId, TransactionRecord, TransferEvent, TxStatus, WriteReceipt,
    WriteReport, WriteResult, DEFAULT_HISTORY_WINDOW, NATIVE_DECIMALS,
};
pub use ports::{
    CallRequest, ChainReader, ImageStore, LedgerClientApi, LogFilter, MockChainClient,
    MockImageStore, MockWallet, RawLog, WalletSession,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
