//! JSON-RPC Chain Adapter
//!
//! Implements the `ChainReader` port on an alloy HTTP provider.
//!
//! No request timeout is set: a slow node keeps the caller waiting.

use alloy::primitives::Bytes;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log, TransactionInput, TransactionRequest};
use alloy::transports::TransportError;
use async_trait::async_trait;
use shared_types::{Address, U256};
use tracing::debug;

use crate::contracts::decode_revert_reason;
use crate::domain::LedgerError;
use crate::ports::{ChainReader, LogFilter, RawLog};

/// EIP-1193 "user rejected request".
const USER_REJECTED: i64 = 4001;

/// EIP-1474 "execution reverted".
const EXECUTION_REVERTED: i64 = 3;

impl From<TransportError> for LedgerError {
    fn from(err: TransportError) -> Self {
        let Some(payload) = err.as_error_resp() else {
            return LedgerError::Network(err.to_string());
        };
        if payload.code == USER_REJECTED {
            return LedgerError::revert(payload.message.to_string());
        }
        if let Some(reason) = payload
            .as_revert_data()
            .and_then(|data| decode_revert_reason(&data))
        {
            return LedgerError::revert(reason);
        }
        if payload.code == EXECUTION_REVERTED || payload.message.to_lowercase().contains("revert") {
            return LedgerError::ContractRevert {
                reason: Some(payload.message.to_string()),
            };
        }
        LedgerError::Network(format!("RPC Error {}: {}", payload.code, payload.message))
    }
}

/// Builds a type-erased HTTP provider. Fillers are left off: the node or
/// the signer behind it owns nonce, gas and chain id.
pub(crate) fn http_provider(url: &str) -> Result<DynProvider, LedgerError> {
    let url: reqwest::Url = url
        .parse()
        .map_err(|e| LedgerError::Network(format!("invalid RPC url {url}: {e}")))?;
    Ok(ProviderBuilder::new()
        .disable_recommended_fillers()
        .connect_http(url)
        .erased())
}

fn into_raw(log: Log) -> Result<RawLog, LedgerError> {
    let pending = || LedgerError::Network("pending log in confirmed range".to_string());
    Ok(RawLog {
        address: log.address(),
        topics: log.topics().to_vec(),
        data: log.data().data.clone(),
        block_number: log.block_number.ok_or_else(pending)?,
        log_index: log.log_index.ok_or_else(pending)?,
        tx_hash: log.transaction_hash.ok_or_else(pending)?,
    })
}

fn to_filter(filter: &LogFilter) -> Filter {
    let [topic0, topic1, topic2] = filter.topics;
    let mut out = Filter::new()
        .address(filter.address)
        .from_block(filter.from_block)
        .to_block(filter.to_block);
    if let Some(topic) = topic0 {
        out = out.event_signature(topic);
    }
    if let Some(topic) = topic1 {
        out = out.topic1(topic);
    }
    if let Some(topic) = topic2 {
        out = out.topic2(topic);
    }
    out
}

/// Chain reader over Ethereum JSON-RPC.
pub struct JsonRpcChainClient {
    provider: DynProvider,
}

impl JsonRpcChainClient {
    /// Create a client for `url`.
    pub fn new(url: &str) -> Result<Self, LedgerError> {
        Ok(Self {
            provider: http_provider(url)?,
        })
    }

    /// Chain id reported by the node.
    pub async fn chain_id(&self) -> Result<u64, LedgerError> {
        Ok(self.provider.get_chain_id().await?)
    }
}

#[async_trait]
impl ChainReader for JsonRpcChainClient {
    async fn block_number(&self) -> Result<u64, LedgerError> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn native_balance(&self, address: Address) -> Result<U256, LedgerError> {
        Ok(self.provider.get_balance(address).await?)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, LedgerError> {
        let tx = TransactionRequest::default()
            .to(to)
            .input(TransactionInput::new(data));
        Ok(self.provider.call(tx).await?)
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, LedgerError> {
        let logs = self.provider.get_logs(&to_filter(filter)).await?;
        debug!(
            "[ledger] eth_getLogs {}..={} returned {} log(s)",
            filter.from_block,
            filter.to_block,
            logs.len()
        );
        logs.into_iter().filter(|l| !l.removed).map(into_raw).collect()
    }

    async fn block_timestamp(&self, block_number: u64) -> Result<u64, LedgerError> {
        let block = self
            .provider
            .get_block_by_number(block_number.into())
            .await?
            .ok_or_else(|| LedgerError::Network(format!("block {block_number} not found")))?;
        Ok(block.header.timestamp)
    }
}
