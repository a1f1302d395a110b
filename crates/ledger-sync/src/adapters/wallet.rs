//! Wallet session over a signing JSON-RPC provider (a browser-wallet bridge,
//! an unlocked dev node or an external signer).

use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{ChainSession, TxHash};
use tracing::{debug, info};

use super::json_rpc::http_provider;
use crate::domain::LedgerError;
use crate::ports::{CallRequest, WalletSession};

/// Wallet session backed by a provider that signs `eth_sendTransaction`.
pub struct RpcWalletSession {
    provider: DynProvider,
    session: RwLock<Option<ChainSession>>,
}

impl RpcWalletSession {
    /// Create a disconnected session for the provider at `url`.
    pub fn new(url: &str) -> Result<Self, LedgerError> {
        Ok(Self {
            provider: http_provider(url)?,
            session: RwLock::new(None),
        })
    }

    /// Asks the provider for its first account and current chain.
    pub async fn connect(&self) -> Result<ChainSession, LedgerError> {
        let (accounts, chain_id) = futures::try_join!(
            async { self.provider.get_accounts().await },
            async { self.provider.get_chain_id().await }
        )?;
        let address = *accounts.first().ok_or(LedgerError::NotConnected)?;
        let session = ChainSession::connected(address, chain_id);
        *self.session.write() = Some(session);
        info!(
            "[ledger] Wallet connected: {} on chain {}",
            session.address, session.chain_id
        );
        Ok(session)
    }

    /// Drops the session.
    pub fn disconnect(&self) {
        if self.session.write().take().is_some() {
            info!("[ledger] Wallet disconnected");
        }
    }
}

#[async_trait]
impl WalletSession for RpcWalletSession {
    fn session(&self) -> Option<ChainSession> {
        (*self.session.read()).and_then(ChainSession::active)
    }

    async fn send_transaction(&self, request: CallRequest) -> Result<TxHash, LedgerError> {
        let tx = TransactionRequest::default()
            .from(request.from)
            .to(request.to)
            .input(TransactionInput::new(request.data))
            .value(request.value);
        let pending = self.provider.send_transaction(tx).await?;
        debug!("[ledger] Provider accepted {}", pending.tx_hash());
        Ok(*pending.tx_hash())
    }
}
