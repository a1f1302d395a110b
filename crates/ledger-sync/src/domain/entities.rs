//! # Domain Entities
//!
//! Records exposed to the UI and the decoded log events they derive from.

use serde::{Deserialize, Serialize};
use shared_types::{Address, TokenAmount, TxHash, U256};
use std::cmp::Ordering;

use super::value_objects::{
    Direction, EventKey, ImageRef, NftMetadata, NftStatus, RecordId, TxStatus,
};

/// A decoded `Transfer(address,address,uint256)` log.
///
/// For the reward token `value` is the amount; for the achievement token it
/// is the token id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    /// Emitting contract.
    pub contract: Address,
    /// Sender (zero address for mints).
    pub from: Address,
    /// Receiver.
    pub to: Address,
    /// Amount or token id.
    pub value: U256,
    /// Block containing the log.
    pub block_number: u64,
    /// Log position within the block.
    pub log_index: u64,
    /// Emitting transaction.
    pub tx_hash: TxHash,
}

impl TransferEvent {
    /// Identity of this log.
    pub fn key(&self) -> EventKey {
        EventKey {
            tx_hash: self.tx_hash,
            log_index: self.log_index,
        }
    }

    /// Chain position, ascending.
    pub fn position(&self) -> (u64, u64) {
        (self.block_number, self.log_index)
    }
}

/// One entry in the transaction feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Local id until reconciled, event key once confirmed.
    pub id: RecordId,
    /// Effect on the session account.
    pub direction: Direction,
    /// Amount moved.
    pub amount: TokenAmount,
    /// The other party.
    pub counterparty: Address,
    /// Unix seconds: block time once confirmed, submission time while local.
    pub timestamp: u64,
    /// Lifecycle state.
    pub status: TxStatus,
    /// Set once the wallet returns a hash.
    pub tx_hash: Option<TxHash>,
    /// Confirmed block, if any.
    pub block_number: Option<u64>,
    /// Confirmed log index, if any.
    pub log_index: Option<u64>,
}

impl TransactionRecord {
    /// Optimistic record for a write about to be broadcast.
    pub fn pending(direction: Direction, amount: TokenAmount, counterparty: Address, now: u64) -> Self {
        Self {
            id: RecordId::local(),
            direction,
            amount,
            counterparty,
            timestamp: now,
            status: TxStatus::Pending,
            tx_hash: None,
            block_number: None,
            log_index: None,
        }
    }

    /// Record derived from a confirmed log.
    pub fn confirmed(
        event: &TransferEvent,
        direction: Direction,
        counterparty: Address,
        amount: TokenAmount,
        timestamp: u64,
    ) -> Self {
        Self {
            id: RecordId::Event(event.key()),
            direction,
            amount,
            counterparty,
            timestamp,
            status: TxStatus::Completed,
            tx_hash: Some(event.tx_hash),
            block_number: Some(event.block_number),
            log_index: Some(event.log_index),
        }
    }

    /// Confirmed event identity, if any.
    pub fn event_key(&self) -> Option<EventKey> {
        match self.id {
            RecordId::Event(key) => Some(key),
            RecordId::Local(_) => None,
        }
    }

    /// True while awaiting confirmation.
    pub fn is_pending(&self) -> bool {
        self.status == TxStatus::Pending
    }

    /// Pending -> Failed. Returns false for any other starting state.
    pub fn mark_failed(&mut self) -> bool {
        if self.status != TxStatus::Pending {
            return false;
        }
        self.status = TxStatus::Failed;
        true
    }

    /// Feed order for confirmed records: newest timestamp first, ties broken
    /// by `(block, logIndex)` descending.
    pub fn cmp_feed_order(&self, other: &Self) -> Ordering {
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.block_number.cmp(&self.block_number))
            .then_with(|| other.log_index.cmp(&self.log_index))
    }
}

/// An achievement token owned (or being minted) by the session account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftRecord {
    /// Local id until reconciled, acquiring event key once confirmed.
    pub id: RecordId,
    /// Absent until the mint is observed on-chain.
    pub token_id: Option<U256>,
    /// Token metadata.
    pub metadata: NftMetadata,
    /// Image reference; never missing, placeholder at worst.
    pub image_ref: ImageRef,
    /// Transaction that minted the token (or transferred it in, for tokens
    /// not minted to this account).
    pub mint_tx_hash: TxHash,
    /// Current owner.
    pub owner: Address,
    /// Lifecycle state.
    pub status: NftStatus,
}

impl NftRecord {
    /// Optimistic record appended right after a mint broadcast.
    pub fn unconfirmed(
        metadata: NftMetadata,
        image_ref: ImageRef,
        mint_tx_hash: TxHash,
        owner: Address,
    ) -> Self {
        Self {
            id: RecordId::local(),
            token_id: None,
            metadata,
            image_ref,
            mint_tx_hash,
            owner,
            status: NftStatus::Unconfirmed,
        }
    }
}
