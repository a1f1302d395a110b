//! # Inbound Ports
//!
//! API trait defining what the ledger client exposes to the UI layer.

use async_trait::async_trait;

use crate::domain::{
    BalanceSnapshot, DonationId, ImageFile, LedgerError, NftMetadata, NftRecord, PriceQuote,
    TransactionRecord, WriteResult,
};

/// Ledger Client API - inbound port.
///
/// Reads refresh the local cache; the feed accessors are synchronous views
/// of it. Every write returns the uniform [`WriteResult`].
#[async_trait]
pub trait LedgerClientApi: Send + Sync {
    /// Native and reward-token balances of the session account.
    async fn balance_snapshot(&self) -> Result<BalanceSnapshot, LedgerError>;

    /// Latest oracle answer.
    async fn price_quote(&self) -> Result<PriceQuote, LedgerError>;

    /// Re-indexes token transfers for the session account.
    ///
    /// Returns non-fatal warnings (partial fetches) on success.
    async fn refresh_history(&self) -> Result<Vec<LedgerError>, LedgerError>;

    /// Re-indexes achievement tokens owned by the session account.
    async fn refresh_nfts(&self) -> Result<Vec<LedgerError>, LedgerError>;

    /// Pending entries first, then confirmed history newest first.
    fn transaction_feed(&self) -> Vec<TransactionRecord>;

    /// Owned achievement tokens, optimistic mints included.
    fn owned_nfts(&self) -> Vec<NftRecord>;

    /// Last known NGO registration status of the session account.
    fn registration_status(&self) -> Option<bool>;

    /// Registers the session account as an NGO.
    async fn register_ngo(&self, name: &str) -> WriteResult;

    /// Records a donation of `amount` reward tokens to `recipient`.
    async fn donate(&self, recipient: &str, amount: &str) -> WriteResult;

    /// Mints an achievement token for a donation.
    async fn mint_achievement(
        &self,
        donation: DonationId,
        metadata: NftMetadata,
        image: ImageFile,
    ) -> WriteResult;

    /// Rewards a donor with reward tokens.
    async fn reward_donor(&self, donor: &str, amount: &str) -> WriteResult;

    /// Requests reward tokens for the session account.
    async fn request_tokens(&self, amount: &str) -> WriteResult;

    /// Transfers reward tokens.
    async fn transfer_tokens(&self, recipient: &str, amount: &str) -> WriteResult;
}
