//! # Event Log Indexer
//!
//! Rebuilds transaction history and NFT holdings from `Transfer` logs over a
//! bounded window of recent blocks.
//!
//! Each fetch runs two independent log queries, one filtered on `from` and
//! one on `to`. If one side fails, the other side's results are kept and
//! the failure is reported as a [`LedgerError::PartialFetch`] warning.

use alloy::sol_types::SolEvent;
use futures::future::{join_all, try_join_all};
use shared_types::{Address, U256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::balance_reader::BalanceReader;
use crate::algorithms::{build_history, current_holdings, decode_transfer_log, distinct_blocks, merge_events};
use crate::contracts::{ContractBindings, IRewardToken};
use crate::domain::{
    HistoryWindow, ImageRef, LedgerError, NftMetadata, NftRecord, NftStatus, QuerySide, RecordId,
    TransactionRecord, TransferEvent,
};
use crate::ports::{ChainReader, LogFilter};

/// Reconstructed transfer history.
#[derive(Clone, Debug)]
pub struct TransferHistory {
    /// Confirmed records in feed order.
    pub records: Vec<TransactionRecord>,
    /// Non-fatal problems; non-empty means the records may be incomplete.
    pub warnings: Vec<LedgerError>,
    /// Inclusive block range scanned.
    pub range: (u64, u64),
}

impl TransferHistory {
    /// True when one query side failed.
    pub fn is_partial(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, LedgerError::PartialFetch { .. }))
    }

    /// True when nothing went wrong.
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Achievement tokens currently held.
#[derive(Clone, Debug)]
pub struct OwnedNfts {
    /// Confirmed holdings, newest acquisition first.
    pub records: Vec<NftRecord>,
    /// Non-fatal problems; non-empty means the list may be incomplete.
    pub warnings: Vec<LedgerError>,
}

struct TransferScan {
    events: Vec<TransferEvent>,
    warnings: Vec<LedgerError>,
    range: (u64, u64),
}

/// Log-based history reconstruction.
pub struct EventLogIndexer<C: ChainReader> {
    chain: Arc<C>,
    bindings: Arc<ContractBindings>,
    reader: Arc<BalanceReader<C>>,
    placeholder_image_uri: String,
}

impl<C: ChainReader> EventLogIndexer<C> {
    /// Create a new indexer.
    pub fn new(
        chain: Arc<C>,
        bindings: Arc<ContractBindings>,
        reader: Arc<BalanceReader<C>>,
        placeholder_image_uri: impl Into<String>,
    ) -> Self {
        Self {
            chain,
            bindings,
            reader,
            placeholder_image_uri: placeholder_image_uri.into(),
        }
    }

    /// Reward-token transfers involving `address` within `window`.
    pub async fn fetch_transfer_history(
        &self,
        address: Address,
        window: HistoryWindow,
    ) -> Result<TransferHistory, LedgerError> {
        let token = self.bindings.reward_token.address;
        let (scan, decimals) =
            futures::try_join!(self.scan_transfers(token, address, window), self.reader.token_decimals())?;

        let events = merge_events(scan.events, Vec::new());
        let timestamps = self.block_timestamps(&events).await?;
        let records = build_history(&events, address, decimals, &timestamps);

        info!(
            "[ledger] Indexed {} transfer(s) for {} in blocks {}..={} ({} warning(s))",
            records.len(),
            address,
            scan.range.0,
            scan.range.1,
            scan.warnings.len()
        );
        Ok(TransferHistory {
            records,
            warnings: scan.warnings,
            range: scan.range,
        })
    }

    /// Achievement tokens held by `address`, judged from transfers within
    /// `window`.
    pub async fn fetch_owned_nfts(
        &self,
        address: Address,
        window: HistoryWindow,
    ) -> Result<OwnedNfts, LedgerError> {
        let nft = self.bindings.achievement_nft.address;
        let scan = self.scan_transfers(nft, address, window).await?;
        let mut warnings = scan.warnings;

        let held = current_holdings(scan.events, address);
        let uris = join_all(held.iter().map(|t| self.reader.token_uri(t.token_id))).await;

        let records = held
            .into_iter()
            .zip(uris)
            .map(|(token, uri)| {
                let (metadata, image_ref) = match uri {
                    Ok(uri) => self.parse_token_uri(&uri, token.token_id),
                    Err(e) => {
                        warn!("[ledger] tokenURI({}) failed: {}", token.token_id, e);
                        warnings.push(e);
                        self.fallback_metadata(token.token_id)
                    }
                };
                NftRecord {
                    id: RecordId::Event(token.acquired.key()),
                    token_id: Some(token.token_id),
                    metadata,
                    image_ref,
                    mint_tx_hash: token.acquired.tx_hash,
                    owner: address,
                    status: NftStatus::Confirmed,
                }
            })
            .collect::<Vec<_>>();

        debug!("[ledger] {} holds {} achievement token(s)", address, records.len());
        Ok(OwnedNfts { records, warnings })
    }

    /// Runs the sent and received queries concurrently and decodes both.
    async fn scan_transfers(
        &self,
        contract: Address,
        account: Address,
        window: HistoryWindow,
    ) -> Result<TransferScan, LedgerError> {
        let latest = self.chain.block_number().await?;
        let (from_block, to_block) = window.bounds(latest);
        let topic = Some(IRewardToken::Transfer::SIGNATURE_HASH);
        let account_topic = Some(account.into_word());

        let sent_filter = LogFilter {
            address: contract,
            topics: [topic, account_topic, None],
            from_block,
            to_block,
        };
        let received_filter = LogFilter {
            address: contract,
            topics: [topic, None, account_topic],
            from_block,
            to_block,
        };

        let (sent, received) = tokio::join!(
            self.chain.logs(&sent_filter),
            self.chain.logs(&received_filter)
        );

        let mut warnings = Vec::new();
        let mut raw_logs = Vec::new();
        match (sent, received) {
            (Err(sent_err), Err(received_err)) => {
                warn!("[ledger] Both log queries failed for {}", account);
                return Err(LedgerError::Network(format!(
                    "sent query: {sent_err}; received query: {received_err}"
                )));
            }
            (sent, received) => {
                for (side, result) in [(QuerySide::Sent, sent), (QuerySide::Received, received)] {
                    match result {
                        Ok(logs) => raw_logs.extend(logs),
                        Err(e) => {
                            warn!("[ledger] {} log query failed, keeping other side: {}", side, e);
                            warnings.push(LedgerError::PartialFetch {
                                side,
                                reason: e.to_string(),
                            });
                        }
                    }
                }
            }
        }

        let mut events = Vec::with_capacity(raw_logs.len());
        for log in &raw_logs {
            match decode_transfer_log(log) {
                Ok(event) => events.push(event),
                Err(e) => {
                    warn!("[ledger] Skipping log: {}", e);
                    warnings.push(e);
                }
            }
        }

        Ok(TransferScan {
            events,
            warnings,
            range: (from_block, to_block),
        })
    }

    /// One timestamp lookup per distinct block.
    async fn block_timestamps(&self, events: &[TransferEvent]) -> Result<HashMap<u64, u64>, LedgerError> {
        let blocks = distinct_blocks(events);
        let lookups = blocks.iter().map(|&block| async move {
            self.chain
                .block_timestamp(block)
                .await
                .map(|timestamp| (block, timestamp))
        });
        let timestamps = try_join_all(lookups)
            .await
            .inspect_err(|e| warn!("[ledger] Block timestamp lookup failed: {}", e))?;
        Ok(timestamps.into_iter().collect())
    }

    /// Token URIs written by this client are inline JSON metadata. Anything
    /// else is kept as an opaque reference with default metadata.
    fn parse_token_uri(&self, uri: &str, token_id: U256) -> (NftMetadata, ImageRef) {
        match serde_json::from_str::<NftMetadata>(uri) {
            Ok(metadata) => {
                let image_ref = match &metadata.image {
                    Some(image) if !image.is_empty() => ImageRef::Remote(image.clone()),
                    _ => ImageRef::Placeholder(self.placeholder_image_uri.clone()),
                };
                (metadata, image_ref)
            }
            Err(_) => {
                debug!("[ledger] tokenURI({}) is not inline metadata", token_id);
                self.fallback_metadata(token_id)
            }
        }
    }

    fn fallback_metadata(&self, token_id: U256) -> (NftMetadata, ImageRef) {
        (
            NftMetadata::new(format!("Achievement #{token_id}"), ""),
            ImageRef::Placeholder(self.placeholder_image_uri.clone()),
        )
    }
}
