//! # History Merge
//!
//! Turns the `sent` and `received` halves of a transfer query into one
//! deterministic, duplicate-free history.
//!
//! ## Ordering
//!
//! Records are sorted by block timestamp descending, ties broken by
//! `(blockNumber, logIndex)` descending. Since `(txHash, logIndex)` is unique
//! per log and the sort key is total over distinct logs, the output does not
//! depend on which half a log arrived in or in what order.

use std::collections::{BTreeSet, HashMap};

use alloy::sol_types::SolEvent;
use shared_types::{Address, TokenAmount};

use crate::contracts::{IAchievementNft, IRewardToken};
use crate::domain::{Direction, EventKey, LedgerError, TransactionRecord, TransferEvent};
use crate::ports::RawLog;

/// Decodes a `Transfer(address,address,uint256)` log.
///
/// ERC-20 carries the value in `data`; ERC-721 indexes it as `topic3`.
/// Both share `topic0`, so the topic count picks the layout.
pub fn decode_transfer_log(log: &RawLog) -> Result<TransferEvent, LedgerError> {
    let malformed = |what: &str| {
        LedgerError::Network(format!(
            "malformed Transfer log {}#{}: {what}",
            log.tx_hash, log.log_index
        ))
    };

    if log.topics.first() != Some(&IRewardToken::Transfer::SIGNATURE_HASH) {
        return Err(malformed("unexpected topic0"));
    }
    let topics = log.topics.iter().copied();
    let (from, to, value) = if log.topics.len() == 4 {
        let nft = IAchievementNft::Transfer::decode_raw_log(topics, &log.data)
            .map_err(|e| malformed(&e.to_string()))?;
        (nft.from, nft.to, nft.tokenId)
    } else {
        let token = IRewardToken::Transfer::decode_raw_log(topics, &log.data)
            .map_err(|e| malformed(&e.to_string()))?;
        (token.from, token.to, token.value)
    };

    Ok(TransferEvent {
        contract: log.address,
        from,
        to,
        value,
        block_number: log.block_number,
        log_index: log.log_index,
        tx_hash: log.tx_hash,
    })
}

/// Direction and counterparty of an event relative to `account`.
pub fn classify(event: &TransferEvent, account: Address) -> (Direction, Address) {
    if event.from.is_zero() {
        (Direction::Earned, event.from)
    } else if event.from == account {
        (Direction::Spent, event.to)
    } else {
        (Direction::Received, event.from)
    }
}

/// Union of both halves, deduplicated by `(txHash, logIndex)`, in
/// descending chain position.
pub fn merge_events(sent: Vec<TransferEvent>, received: Vec<TransferEvent>) -> Vec<TransferEvent> {
    let mut by_key: HashMap<EventKey, TransferEvent> = HashMap::new();
    for event in sent.into_iter().chain(received) {
        by_key.entry(event.key()).or_insert(event);
    }
    let mut merged: Vec<_> = by_key.into_values().collect();
    merged.sort_by(|a, b| {
        b.position()
            .cmp(&a.position())
            .then_with(|| b.tx_hash.cmp(&a.tx_hash))
    });
    merged
}

/// Block numbers needing a timestamp lookup, each once.
pub fn distinct_blocks(events: &[TransferEvent]) -> Vec<u64> {
    events
        .iter()
        .map(|e| e.block_number)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Classifies merged events for `account` and returns them in feed order.
///
/// `timestamps` must cover every block in `events`; a missing entry sorts
/// as time zero.
pub fn build_history(
    events: &[TransferEvent],
    account: Address,
    decimals: u8,
    timestamps: &HashMap<u64, u64>,
) -> Vec<TransactionRecord> {
    let mut records: Vec<_> = events
        .iter()
        .map(|event| {
            let (direction, counterparty) = classify(event, account);
            let timestamp = timestamps.get(&event.block_number).copied().unwrap_or_default();
            TransactionRecord::confirmed(
                event,
                direction,
                counterparty,
                TokenAmount::new(event.value, decimals),
                timestamp,
            )
        })
        .collect();
    sort_history(&mut records);
    records
}

/// Sorts confirmed records into feed order.
pub fn sort_history(records: &mut [TransactionRecord]) {
    records.sort_by(|a, b| {
        a.cmp_feed_order(b)
            .then_with(|| b.tx_hash.cmp(&a.tx_hash))
    });
}
