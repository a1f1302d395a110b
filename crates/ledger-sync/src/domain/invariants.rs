//! # Domain Invariants
//!
//! Rules the cache and the indexer must always uphold.

use std::collections::HashSet;

use super::entities::TransactionRecord;

/// Default number of recent blocks scanned for history.
pub const DEFAULT_HISTORY_WINDOW: u64 = 10_000;

/// Decimal count of the chain's native currency.
pub const NATIVE_DECIMALS: u8 = 18;

/// Invariant: no two records represent the same confirmed event.
pub fn invariant_unique_events(records: &[TransactionRecord]) -> bool {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(TransactionRecord::event_key)
        .all(|key| seen.insert(key))
}

/// Invariant: confirmed history is in feed order.
pub fn invariant_history_ordered(records: &[TransactionRecord]) -> bool {
    records
        .windows(2)
        .all(|pair| pair[0].cmp_feed_order(&pair[1]).is_le())
}
