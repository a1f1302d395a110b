//! # Ledger Service
//!
//! The object handed to the UI. Owns the reader, writer, indexer and cache
//! and wires them to one chain client and one wallet session. It is
//! constructed explicitly and passed to consumers; there is no global.

use async_trait::async_trait;
use shared_types::ChainSession;
use std::sync::Arc;
use tracing::{warn, Instrument};

use super::balance_reader::BalanceReader;
use super::contract_writer::ContractWriter;
use super::event_indexer::EventLogIndexer;
use super::session::require_session;
use super::state_cache::LocalStateCache;
use crate::config::LedgerSyncConfig;
use crate::contracts::ContractBindings;
use crate::domain::{
    BalanceSnapshot, DonationId, HistoryWindow, ImageFile, LedgerError, NftMetadata, NftRecord,
    PriceQuote, TransactionRecord, WriteResult,
};
use crate::ports::{ChainReader, ImageStore, LedgerClientApi, WalletSession};

/// Ledger Service - orchestrates reads, writes and reconciliation.
pub struct LedgerService<C: ChainReader, W: WalletSession> {
    config: LedgerSyncConfig,
    bindings: Arc<ContractBindings>,
    wallet: Arc<W>,
    cache: Arc<LocalStateCache>,
    reader: Arc<BalanceReader<C>>,
    writer: ContractWriter<C, W>,
    indexer: EventLogIndexer<C>,
}

impl<C: ChainReader, W: WalletSession> LedgerService<C, W> {
    /// Create a new service. `image_store` is `None` when no remote store is
    /// configured.
    pub fn new(
        config: LedgerSyncConfig,
        bindings: ContractBindings,
        chain: Arc<C>,
        wallet: Arc<W>,
        image_store: Option<Arc<dyn ImageStore>>,
    ) -> Self {
        let bindings = Arc::new(bindings);
        let cache = Arc::new(LocalStateCache::new());
        let reader = Arc::new(BalanceReader::new(
            chain.clone(),
            bindings.clone(),
            config.native_decimals,
        ));
        let writer = ContractWriter::new(
            config.clone(),
            bindings.clone(),
            wallet.clone(),
            reader.clone(),
            cache.clone(),
            image_store,
        );
        let indexer = EventLogIndexer::new(
            chain,
            bindings.clone(),
            reader.clone(),
            config.placeholder_image_uri.clone(),
        );
        Self {
            config,
            bindings,
            wallet,
            cache,
            reader,
            writer,
            indexer,
        }
    }

    /// Read-only queries.
    pub fn reader(&self) -> &BalanceReader<C> {
        &self.reader
    }

    /// Log indexer.
    pub fn indexer(&self) -> &EventLogIndexer<C> {
        &self.indexer
    }

    /// The local read model.
    pub fn cache(&self) -> &LocalStateCache {
        &self.cache
    }

    /// Service configuration.
    pub fn config(&self) -> &LedgerSyncConfig {
        &self.config
    }

    fn session(&self) -> Result<ChainSession, LedgerError> {
        require_session(self.wallet.as_ref(), self.config.chain_id, &self.cache)
    }

    /// Brings the cache in line with the wallet before a synchronous view.
    fn observe_session(&self) {
        if let Err(e) = self.session() {
            if !matches!(e, LedgerError::NotConnected) {
                warn!("[ledger] Serving cached view without a usable session: {}", e);
            }
        }
    }

    fn window(&self) -> HistoryWindow {
        HistoryWindow::new(self.config.history_block_window)
    }
}

#[async_trait]
impl<C: ChainReader, W: WalletSession> LedgerClientApi for LedgerService<C, W> {
    async fn balance_snapshot(&self) -> Result<BalanceSnapshot, LedgerError> {
        let session = self.session()?;
        let (native, token) = futures::try_join!(
            self.reader.native_balance(session.address),
            self.reader.token_balance(session.address, self.bindings.reward_token.address)
        )?;
        let snapshot = BalanceSnapshot { native, token };
        self.cache.set_balances(session.address, snapshot);
        Ok(snapshot)
    }

    async fn price_quote(&self) -> Result<PriceQuote, LedgerError> {
        self.session()?;
        self.reader.price_quote().await
    }

    async fn refresh_history(&self) -> Result<Vec<LedgerError>, LedgerError> {
        let session = self.session()?;
        let span = tracing::info_span!("refresh_history", account = %session.address);
        let history = self
            .indexer
            .fetch_transfer_history(session.address, self.window())
            .instrument(span)
            .await?;
        let complete = history.is_complete();
        if !self
            .cache
            .apply_confirmed_history(session.address, history.records, complete)
        {
            warn!("[ledger] Session changed during history refresh, result discarded");
        }
        Ok(history.warnings)
    }

    async fn refresh_nfts(&self) -> Result<Vec<LedgerError>, LedgerError> {
        let session = self.session()?;
        let span = tracing::info_span!("refresh_nfts", account = %session.address);
        let owned = self
            .indexer
            .fetch_owned_nfts(session.address, self.window())
            .instrument(span)
            .await?;
        let complete = !owned
            .warnings
            .iter()
            .any(|w| matches!(w, LedgerError::PartialFetch { .. }));
        if !self
            .cache
            .apply_confirmed_nfts(session.address, owned.records, complete)
        {
            warn!("[ledger] Session changed during NFT refresh, result discarded");
        }
        Ok(owned.warnings)
    }

    fn transaction_feed(&self) -> Vec<TransactionRecord> {
        self.observe_session();
        self.cache.transaction_feed()
    }

    fn owned_nfts(&self) -> Vec<NftRecord> {
        self.observe_session();
        self.cache.owned_nfts()
    }

    fn registration_status(&self) -> Option<bool> {
        self.observe_session();
        self.cache.registration()
    }

    async fn register_ngo(&self, name: &str) -> WriteResult {
        self.writer.submit_ngo_registration(name).await
    }

    async fn donate(&self, recipient: &str, amount: &str) -> WriteResult {
        self.writer.submit_donation(recipient, amount).await
    }

    async fn mint_achievement(
        &self,
        donation: DonationId,
        metadata: NftMetadata,
        image: ImageFile,
    ) -> WriteResult {
        self.writer.submit_nft_mint(donation, metadata, image).await
    }

    async fn reward_donor(&self, donor: &str, amount: &str) -> WriteResult {
        self.writer.submit_token_reward(donor, amount).await
    }

    async fn request_tokens(&self, amount: &str) -> WriteResult {
        self.writer.submit_token_request(amount).await
    }

    async fn transfer_tokens(&self, recipient: &str, amount: &str) -> WriteResult {
        self.writer.submit_token_transfer(recipient, amount).await
    }
}
