//! # Application Module
//!
//! Services orchestrating the domain, the contract bindings and the
//! outbound ports.

pub mod balance_reader;
pub mod contract_writer;
pub mod event_indexer;
pub mod service;
pub mod session;
pub mod state_cache;

pub use balance_reader::BalanceReader;
pub use contract_writer::ContractWriter;
pub use event_indexer::{EventLogIndexer, OwnedNfts, TransferHistory};
pub use service::LedgerService;
pub use session::require_session;
pub use state_cache::LocalStateCache;
