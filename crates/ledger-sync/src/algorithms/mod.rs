//! # Algorithms Module
//!
//! Pure history reconstruction: log decoding, classification, merging and
//! NFT ownership replay. No I/O.

pub mod history_merge;
pub mod nft_ownership;

pub use history_merge::{
    build_history, classify, decode_transfer_log, distinct_blocks, merge_events, sort_history,
};
pub use nft_ownership::{current_holdings, OwnedToken};
