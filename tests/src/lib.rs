//! # Ledger Sync Test Suite
//!
//! Cross-crate flows driving `LedgerService` end to end through the mock
//! chain, wallet and image store.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs       # Harness and log builders
//!     ├── write_flows.rs    # Validation, broadcast, optimistic records
//!     └── history_flows.rs  # Log-based history and NFT reconciliation
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ledger-tests
//! cargo test -p ledger-tests integration::history_flows
//! ```

#![allow(dead_code)]

pub mod integration;
