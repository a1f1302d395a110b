//! # Local State Cache
//!
//! Merges optimistic records (created by writes before the chain confirms
//! them) with the confirmed set produced by the indexer, and exposes one
//! read model to the UI.
//!
//! ## Reconciliation
//!
//! Records are keyed by transaction identity. A pending record whose
//! `txHash` shows up in confirmed history is dropped in favour of the
//! confirmed record, so a transaction is never listed twice. Optimistic NFT
//! records reconcile the same way on `mintTxHash`.
//!
//! The cache is bound to one session address and is emptied when that
//! address changes or the session ends. The lock only guards the data
//! structure and is never held across an await point.

use parking_lot::RwLock;
use shared_types::{Address, TxHash};
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

use crate::algorithms::sort_history;
use crate::domain::{BalanceSnapshot, NftRecord, RecordId, TransactionRecord, TxStatus};

#[derive(Default)]
struct CacheState {
    account: Option<Address>,
    /// Optimistic records in submission order (pending and failed).
    optimistic: Vec<TransactionRecord>,
    /// Confirmed history in feed order.
    confirmed: Vec<TransactionRecord>,
    optimistic_nfts: Vec<NftRecord>,
    confirmed_nfts: Vec<NftRecord>,
    balances: Option<BalanceSnapshot>,
    registered: Option<bool>,
}

/// Transient client-side read model. Rebuilt from the ledger on reconnect.
#[derive(Default)]
pub struct LocalStateCache {
    state: RwLock<CacheState>,
}

impl LocalStateCache {
    /// Empty, unbound cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the cache to `account`, clearing it if it was built for a
    /// different one. Returns true when the cache was reset.
    pub fn bind_session(&self, account: Address) -> bool {
        let mut state = self.state.write();
        if state.account == Some(account) {
            return false;
        }
        let previous = state.account;
        *state = CacheState {
            account: Some(account),
            ..CacheState::default()
        };
        debug!("[ledger] Cache rebound from {:?} to {}", previous, account);
        true
    }

    /// Drops everything, including the bound account.
    pub fn clear(&self) {
        *self.state.write() = CacheState::default();
    }

    /// Account the cache currently describes.
    pub fn account(&self) -> Option<Address> {
        self.state.read().account
    }

    /// Adds an optimistic record and returns its local id.
    pub fn add_pending(&self, mut record: TransactionRecord) -> Uuid {
        let id = match record.id {
            RecordId::Local(id) => id,
            RecordId::Event(_) => {
                let id = Uuid::new_v4();
                record.id = RecordId::Local(id);
                id
            }
        };
        self.state.write().optimistic.push(record);
        id
    }

    /// Records the hash the wallet returned for an optimistic record.
    pub fn attach_tx_hash(&self, id: Uuid, tx_hash: TxHash) -> bool {
        let mut state = self.state.write();
        match state.optimistic.iter_mut().find(|r| r.id.as_local() == Some(id)) {
            Some(record) => {
                record.tx_hash = Some(tx_hash);
                true
            }
            None => false,
        }
    }

    /// Pending -> Failed after an explicit broadcast rejection.
    pub fn mark_failed(&self, id: Uuid) -> bool {
        let mut state = self.state.write();
        state
            .optimistic
            .iter_mut()
            .find(|r| r.id.as_local() == Some(id))
            .map_or(false, TransactionRecord::mark_failed)
    }

    /// Installs confirmed history for `account`.
    ///
    /// A complete fetch replaces the confirmed set. A partial one is merged
    /// into it so a failed query side does not erase known history.
    /// Returns false, changing nothing, if the cache is bound elsewhere.
    pub fn apply_confirmed_history(
        &self,
        account: Address,
        records: Vec<TransactionRecord>,
        complete: bool,
    ) -> bool {
        let mut state = self.state.write();
        if state.account != Some(account) {
            return false;
        }

        let mut confirmed = if complete {
            records
        } else {
            let mut by_key: HashMap<_, _> = state
                .confirmed
                .drain(..)
                .filter_map(|r| r.event_key().map(|k| (k, r)))
                .collect();
            for record in records {
                if let Some(key) = record.event_key() {
                    by_key.insert(key, record);
                }
            }
            by_key.into_values().collect()
        };
        sort_history(&mut confirmed);

        let confirmed_hashes: HashSet<TxHash> =
            confirmed.iter().filter_map(|r| r.tx_hash).collect();
        let before = state.optimistic.len();
        state
            .optimistic
            .retain(|r| !r.tx_hash.map_or(false, |h| confirmed_hashes.contains(&h)));
        let reconciled = before - state.optimistic.len();
        if reconciled > 0 {
            debug!("[ledger] Reconciled {} optimistic record(s)", reconciled);
        }

        state.confirmed = confirmed;
        true
    }

    /// Adds an optimistic NFT record.
    pub fn add_pending_nft(&self, record: NftRecord) {
        self.state.write().optimistic_nfts.push(record);
    }

    /// Installs confirmed NFT holdings for `account`, with the same
    /// replace/merge rule as [`apply_confirmed_history`](Self::apply_confirmed_history).
    pub fn apply_confirmed_nfts(&self, account: Address, records: Vec<NftRecord>, complete: bool) -> bool {
        let mut state = self.state.write();
        if state.account != Some(account) {
            return false;
        }

        let confirmed = if complete {
            records
        } else {
            let mut merged = std::mem::take(&mut state.confirmed_nfts);
            for record in records {
                merged.retain(|r| r.token_id != record.token_id);
                merged.push(record);
            }
            merged
        };

        let mint_hashes: HashSet<TxHash> = confirmed.iter().map(|r| r.mint_tx_hash).collect();
        state
            .optimistic_nfts
            .retain(|r| !mint_hashes.contains(&r.mint_tx_hash));
        state.confirmed_nfts = confirmed;
        true
    }

    /// The merged feed: pending newest first, then failed, then confirmed
    /// history in feed order.
    pub fn transaction_feed(&self) -> Vec<TransactionRecord> {
        let state = self.state.read();
        let newest_first = |status: TxStatus| {
            let mut records: Vec<_> = state
                .optimistic
                .iter()
                .rev()
                .filter(|r| r.status == status)
                .cloned()
                .collect();
            records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            records
        };

        let mut feed = newest_first(TxStatus::Pending);
        feed.extend(newest_first(TxStatus::Failed));
        feed.extend(state.confirmed.iter().cloned());
        feed
    }

    /// Optimistic mints newest first, then confirmed holdings.
    pub fn owned_nfts(&self) -> Vec<NftRecord> {
        let state = self.state.read();
        state
            .optimistic_nfts
            .iter()
            .rev()
            .chain(state.confirmed_nfts.iter())
            .cloned()
            .collect()
    }

    /// Stores a balance snapshot for the bound account.
    pub fn set_balances(&self, account: Address, snapshot: BalanceSnapshot) {
        let mut state = self.state.write();
        if state.account == Some(account) {
            state.balances = Some(snapshot);
        }
    }

    /// Last stored balance snapshot.
    pub fn balances(&self) -> Option<BalanceSnapshot> {
        self.state.read().balances
    }

    /// Stores the NGO registration status for the bound account.
    pub fn set_registration(&self, account: Address, registered: bool) {
        let mut state = self.state.write();
        if state.account == Some(account) {
            state.registered = Some(registered);
        }
    }

    /// Last known NGO registration status.
    pub fn registration(&self) -> Option<bool> {
        self.state.read().registered
    }
}
