//! # Contract Writer
//!
//! Builds, validates and broadcasts state-changing calls through the
//! external wallet, recording optimistic entries in the local cache.
//!
//! ## Write Pipeline
//!
//! ```text
//! session check -> input validation -> (decimals read) -> pending record
//!   -> wallet broadcast -> attach txHash | mark failed
//! ```
//!
//! Input that can be rejected without the chain is rejected before any
//! network call. Writes are not queued or sequenced here: two writes
//! submitted concurrently reach the wallet in whatever order their futures
//! are polled, and the wallet decides nonce order.

use alloy::sol_types::SolCall;
use shared_types::{decimal_is_nonzero, Address, ChainSession, TokenAmount, U256};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info, warn};

use super::balance_reader::BalanceReader;
use super::session::require_session;
use super::state_cache::LocalStateCache;
use crate::config::LedgerSyncConfig;
use crate::contracts::{ContractBindings, IAchievementNft, IDonationCore, IRewardToken};
use crate::domain::{
    BalanceSnapshot, Direction, DonationId, ImageFile, ImageRef, LedgerError, NftMetadata,
    NftRecord, RecordId, TransactionRecord, WriteReceipt, WriteResult,
};
use crate::ports::{CallRequest, ChainReader, ImageStore, WalletSession};

/// Seconds since the Unix epoch, for optimistic record timestamps.
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Rejects unusable amounts without knowing the token's scale.
fn precheck_amount(amount: &str) -> Result<(), LedgerError> {
    if !decimal_is_nonzero(amount)? {
        return Err(LedgerError::Validation(
            "amount must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn parse_recipient(recipient: &str) -> Result<Address, LedgerError> {
    let address = recipient
        .trim()
        .parse::<Address>()
        .map_err(|e| LedgerError::Validation(format!("invalid recipient address: {e}")))?;
    if address.is_zero() {
        return Err(LedgerError::Validation(
            "recipient must not be the zero address".to_string(),
        ));
    }
    Ok(address)
}

fn logged_rejection<T>(op: &str, result: Result<T, LedgerError>) -> Result<T, LedgerError> {
    result.inspect_err(|e| warn!("[ledger] {} rejected before submission: {}", op, e))
}

/// State-changing calls against the bound contracts.
pub struct ContractWriter<C: ChainReader, W: WalletSession> {
    config: LedgerSyncConfig,
    bindings: Arc<ContractBindings>,
    wallet: Arc<W>,
    reader: Arc<BalanceReader<C>>,
    cache: Arc<LocalStateCache>,
    image_store: Option<Arc<dyn ImageStore>>,
}

impl<C: ChainReader, W: WalletSession> ContractWriter<C, W> {
    /// Create a new writer.
    pub fn new(
        config: LedgerSyncConfig,
        bindings: Arc<ContractBindings>,
        wallet: Arc<W>,
        reader: Arc<BalanceReader<C>>,
        cache: Arc<LocalStateCache>,
        image_store: Option<Arc<dyn ImageStore>>,
    ) -> Self {
        Self {
            config,
            bindings,
            wallet,
            reader,
            cache,
            image_store,
        }
    }

    /// Registers the session account as an NGO, then refreshes its
    /// registration status on a best-effort basis.
    pub async fn submit_ngo_registration(&self, name: &str) -> WriteResult {
        let session = self.session()?;
        let name = name.trim();
        if name.is_empty() {
            return logged_rejection(
                "registerNGO",
                Err(LedgerError::Validation("NGO name must not be empty".to_string())),
            );
        }

        let data = IDonationCore::registerNGOCall {
            name: name.to_string(),
        }
        .abi_encode();
        let receipt = self
            .broadcast("registerNGO", session, self.bindings.core.address, data, None)
            .await?;

        match self.reader.is_registered(session.address).await {
            Ok(registered) => self.cache.set_registration(session.address, registered),
            Err(e) => warn!("[ledger] Registration status refresh failed (ignored): {}", e),
        }
        Ok(receipt)
    }

    /// Donates `amount` reward tokens to `recipient` through the core
    /// contract.
    pub async fn submit_donation(&self, recipient: &str, amount: &str) -> WriteResult {
        let session = self.session()?;
        let (recipient, amount) =
            logged_rejection("donate", self.validate_transfer_input(recipient, amount))?;
        let amount = self.scale(amount).await?;

        let data = IDonationCore::donateCall {
            ngo: recipient,
            amount: amount.raw(),
        }
        .abi_encode();
        let pending = TransactionRecord::pending(Direction::Spent, amount, recipient, unix_now());
        self.broadcast("donate", session, self.bindings.core.address, data, Some(pending))
            .await
    }

    /// Mints an achievement token for `donation` to the session account.
    ///
    /// The image is uploaded first when a store is configured; without one
    /// the configured placeholder is used. On broadcast success an
    /// unconfirmed NFT record is added to the cache immediately.
    pub async fn submit_nft_mint(
        &self,
        donation: DonationId,
        metadata: NftMetadata,
        image: ImageFile,
    ) -> WriteResult {
        let session = self.session()?;
        if metadata.name.trim().is_empty() {
            return logged_rejection(
                "mintAchievement",
                Err(LedgerError::Validation("achievement name must not be empty".to_string())),
            );
        }

        let image_ref = self.resolve_image(&image).await?;
        let mut metadata = metadata;
        metadata.image = Some(image_ref.uri().to_string());
        let token_uri = serde_json::to_string(&metadata)
            .map_err(|e| LedgerError::Validation(format!("metadata not serializable: {e}")))?;

        let data = IAchievementNft::mintAchievementCall {
            to: session.address,
            donationId: donation.0,
            tokenURI: token_uri,
        }
        .abi_encode();
        let receipt = self
            .broadcast(
                "mintAchievement",
                session,
                self.bindings.achievement_nft.address,
                data,
                None,
            )
            .await?;

        let record = NftRecord::unconfirmed(metadata, image_ref, receipt.tx_hash, session.address);
        let record_id = record.id;
        self.cache.add_pending_nft(record);
        Ok(WriteReceipt {
            record_id: Some(record_id),
            ..receipt
        })
    }

    /// Rewards `donor` with reward tokens.
    ///
    /// Only a reward to the session account itself gets an optimistic
    /// feed entry.
    pub async fn submit_token_reward(&self, donor: &str, amount: &str) -> WriteResult {
        let session = self.session()?;
        let (donor, amount) =
            logged_rejection("rewardDonor", self.validate_transfer_input(donor, amount))?;
        let amount = self.scale(amount).await?;

        let data = IDonationCore::rewardDonorCall {
            donor,
            amount: amount.raw(),
        }
        .abi_encode();
        let pending = (donor == session.address)
            .then(|| TransactionRecord::pending(Direction::Earned, amount, Address::ZERO, unix_now()));
        self.broadcast("rewardDonor", session, self.bindings.core.address, data, pending)
            .await
    }

    /// Requests reward tokens for the session account.
    pub async fn submit_token_request(&self, amount: &str) -> WriteResult {
        let session = self.session()?;
        logged_rejection("requestTokens", precheck_amount(amount))?;
        let amount = self.scale(amount).await?;

        let data = IDonationCore::requestTokensCall {
            amount: amount.raw(),
        }
        .abi_encode();
        let pending = TransactionRecord::pending(Direction::Earned, amount, Address::ZERO, unix_now());
        self.broadcast(
            "requestTokens",
            session,
            self.bindings.core.address,
            data,
            Some(pending),
        )
        .await
    }

    /// Transfers reward tokens to `recipient`.
    ///
    /// The cached balance, when one exists, is checked as an advisory guard.
    /// If the snapshot is too low it is re-read from the token first, so a
    /// stale snapshot never blocks a transfer the chain would accept. When
    /// that re-read fails the token contract decides.
    pub async fn submit_token_transfer(&self, recipient: &str, amount: &str) -> WriteResult {
        let session = self.session()?;
        let (recipient, amount) =
            logged_rejection("transfer", self.validate_transfer_input(recipient, amount))?;
        let amount = self.scale(amount).await?;
        let guard = self.check_cached_balance(session.address, &amount).await;
        logged_rejection("transfer", guard)?;

        let data = IRewardToken::transferCall {
            to: recipient,
            amount: amount.raw(),
        }
        .abi_encode();
        let pending = TransactionRecord::pending(Direction::Spent, amount, recipient, unix_now());
        self.broadcast(
            "transfer",
            session,
            self.bindings.reward_token.address,
            data,
            Some(pending),
        )
        .await
    }

    fn session(&self) -> Result<ChainSession, LedgerError> {
        require_session(self.wallet.as_ref(), self.config.chain_id, &self.cache)
    }

    fn validate_transfer_input<'a>(
        &self,
        recipient: &str,
        amount: &'a str,
    ) -> Result<(Address, &'a str), LedgerError> {
        let recipient = parse_recipient(recipient)?;
        precheck_amount(amount)?;
        Ok((recipient, amount))
    }

    /// Reads the token's decimals and scales `amount` exactly.
    async fn scale(&self, amount: &str) -> Result<TokenAmount, LedgerError> {
        let decimals = self.reader.token_decimals().await?;
        logged_rejection("scale", TokenAmount::parse(amount, decimals).map_err(LedgerError::from))
    }

    async fn check_cached_balance(&self, account: Address, amount: &TokenAmount) -> Result<(), LedgerError> {
        let Some(snapshot) = self.cache.balances() else {
            return Ok(());
        };
        if amount.cmp_same_scale(&snapshot.token) != Some(std::cmp::Ordering::Greater) {
            return Ok(());
        }

        let fresh = match self.reader.reward_balance(account).await {
            Ok(fresh) => fresh,
            Err(e) => {
                warn!("[ledger] Balance re-read before transfer failed, deferring to contract: {}", e);
                return Ok(());
            }
        };
        self.cache.set_balances(
            account,
            BalanceSnapshot {
                native: snapshot.native,
                token: fresh,
            },
        );
        match amount.cmp_same_scale(&fresh) {
            Some(std::cmp::Ordering::Greater) => Err(LedgerError::Validation(format!(
                "amount {} exceeds balance {}",
                amount, fresh
            ))),
            _ => Ok(()),
        }
    }

    async fn resolve_image(&self, image: &ImageFile) -> Result<ImageRef, LedgerError> {
        match &self.image_store {
            Some(store) => {
                let uri = store
                    .upload(image)
                    .await
                    .inspect_err(|e| error!("[ledger] Image upload for {} failed: {}", image.file_name, e))?;
                Ok(ImageRef::Remote(uri))
            }
            None => {
                info!(
                    "[ledger] No image store configured, using placeholder for {}",
                    image.file_name
                );
                Ok(ImageRef::Placeholder(self.config.placeholder_image_uri.clone()))
            }
        }
    }

    /// Hands the call to the wallet and settles the optimistic record.
    async fn broadcast(
        &self,
        op: &'static str,
        session: ChainSession,
        to: Address,
        data: Vec<u8>,
        pending: Option<TransactionRecord>,
    ) -> WriteResult {
        let local_id = pending.map(|record| self.cache.add_pending(record));
        let request = CallRequest {
            from: session.address,
            to,
            data: data.into(),
            value: U256::ZERO,
        };

        match self.wallet.send_transaction(request).await {
            Ok(tx_hash) => {
                if let Some(id) = local_id {
                    self.cache.attach_tx_hash(id, tx_hash);
                }
                info!("[ledger] {} broadcast: {}", op, tx_hash);
                Ok(WriteReceipt {
                    tx_hash,
                    record_id: local_id.map(RecordId::Local),
                })
            }
            Err(e @ LedgerError::ContractRevert { .. }) => {
                if let Some(id) = local_id {
                    self.cache.mark_failed(id);
                }
                error!("[ledger] {} rejected: {}", op, e);
                Err(e)
            }
            Err(e) => {
                // The wallet may still have broadcast it.
                if let Some(id) = local_id {
                    warn!("[ledger] {} outcome unknown, record {} stays pending: {}", op, id, e);
                } else {
                    error!("[ledger] {} failed: {}", op, e);
                }
                Err(e)
            }
        }
    }
}
