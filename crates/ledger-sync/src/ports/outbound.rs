//! # Outbound Ports
//!
//! Traits for external dependencies: the chain RPC client, the external
//! wallet session and the remote image store.
//!
//! The chain reader is read-only from this layer's perspective. Every
//! state-changing call goes through [`WalletSession`].

use alloy::primitives::Bytes;
use alloy::sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{Address, ChainSession, TxHash, B256, U256};
use std::collections::HashMap;

use crate::contracts::IRewardToken;
use crate::domain::{ImageFile, LedgerError};

/// A topic-filtered log query over an inclusive block range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFilter {
    /// Emitting contract.
    pub address: Address,
    /// `topic0..topic2`; `None` matches anything.
    pub topics: [Option<B256>; 3],
    /// First block, inclusive.
    pub from_block: u64,
    /// Last block, inclusive.
    pub to_block: u64,
}

impl LogFilter {
    /// Whether a log satisfies this filter.
    pub fn matches(&self, log: &RawLog) -> bool {
        log.address == self.address
            && (self.from_block..=self.to_block).contains(&log.block_number)
            && self
                .topics
                .iter()
                .enumerate()
                .all(|(i, want)| want.map_or(true, |t| log.topics.get(i) == Some(&t)))
    }
}

/// A log entry as returned by the node, before decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawLog {
    /// Emitting contract.
    pub address: Address,
    /// Indexed topics, `topic0` first.
    pub topics: Vec<B256>,
    /// Non-indexed data.
    pub data: Bytes,
    /// Containing block.
    pub block_number: u64,
    /// Position within the block.
    pub log_index: u64,
    /// Emitting transaction.
    pub tx_hash: TxHash,
}

/// A state-changing call handed to the wallet for signing and broadcast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallRequest {
    /// Session account.
    pub from: Address,
    /// Target contract.
    pub to: Address,
    /// ABI-encoded calldata.
    pub data: Bytes,
    /// Native value attached.
    pub value: U256,
}

/// Chain RPC client - outbound port.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Latest block number.
    async fn block_number(&self) -> Result<u64, LedgerError>;

    /// Native balance in wei.
    async fn native_balance(&self, address: Address) -> Result<U256, LedgerError>;

    /// Read-only contract call; returns raw return data.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, LedgerError>;

    /// Logs matching a filter.
    async fn logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, LedgerError>;

    /// Unix timestamp of a block.
    async fn block_timestamp(&self, block_number: u64) -> Result<u64, LedgerError>;
}

/// External wallet session - outbound port.
///
/// Once [`send_transaction`](WalletSession::send_transaction) is called the
/// request belongs to the wallet; dropping the future does not cancel it.
#[async_trait]
pub trait WalletSession: Send + Sync {
    /// Current session snapshot, `None` when disconnected.
    fn session(&self) -> Option<ChainSession>;

    /// Signs and broadcasts a call. Returns the transaction hash.
    async fn send_transaction(&self, request: CallRequest) -> Result<TxHash, LedgerError>;
}

/// Remote image store - outbound port.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Uploads an image and returns a referenceable URI.
    async fn upload(&self, image: &ImageFile) -> Result<String, LedgerError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Timestamp of block 0 on the mock chain.
pub const MOCK_GENESIS_TIME: u64 = 1_700_000_000;

/// Mock chain client for testing.
///
/// Records every RPC by method name so tests can assert exactly which calls
/// were made (or that none were).
#[derive(Default)]
pub struct MockChainClient {
    state: Mutex<MockChainState>,
    calls: Mutex<Vec<&'static str>>,
}

#[derive(Default)]
struct MockChainState {
    latest_block: u64,
    native_balances: HashMap<Address, U256>,
    call_responses: HashMap<(Address, Bytes), Bytes>,
    selector_responses: HashMap<(Address, [u8; 4]), Bytes>,
    call_errors: HashMap<(Address, [u8; 4]), LedgerError>,
    logs: Vec<RawLog>,
    timestamps: HashMap<u64, u64>,
    unreachable: bool,
    fail_sent_logs: bool,
    fail_received_logs: bool,
}

impl MockChainClient {
    /// Empty chain at block 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the latest block.
    pub fn set_latest_block(&self, block: u64) {
        self.state.lock().latest_block = block;
    }

    /// Makes every RPC fail with a network error.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unreachable = unreachable;
    }

    /// Makes log queries filtered on `from` (topic1) fail.
    pub fn fail_sent_logs(&self, fail: bool) {
        self.state.lock().fail_sent_logs = fail;
    }

    /// Makes log queries filtered on `to` (topic2) fail.
    pub fn fail_received_logs(&self, fail: bool) {
        self.state.lock().fail_received_logs = fail;
    }

    /// Sets a native balance.
    pub fn set_native_balance(&self, address: Address, wei: U256) {
        self.state.lock().native_balances.insert(address, wei);
    }

    /// Return data for one exact call.
    pub fn set_call_response<C: SolCall>(&self, to: Address, call: &C, response: Vec<u8>) {
        self.state
            .lock()
            .call_responses
            .insert((to, call.abi_encode().into()), response.into());
    }

    /// Return data for any call to `to` with this selector.
    pub fn set_selector_response(&self, to: Address, selector: [u8; 4], response: Vec<u8>) {
        self.state
            .lock()
            .selector_responses
            .insert((to, selector), response.into());
    }

    /// Error for any call to `to` with this selector.
    pub fn set_call_error(&self, to: Address, selector: [u8; 4], err: LedgerError) {
        self.state.lock().call_errors.insert((to, selector), err);
    }

    /// `decimals()` answer for a token.
    pub fn set_decimals(&self, token: Address, decimals: u8) {
        self.set_selector_response(
            token,
            IRewardToken::decimalsCall::SELECTOR,
            IRewardToken::decimalsCall::abi_encode_returns(&decimals),
        );
    }

    /// Appends a log.
    pub fn push_log(&self, log: RawLog) {
        self.state.lock().logs.push(log);
    }

    /// Sets a block timestamp. Unset blocks default to
    /// `MOCK_GENESIS_TIME + 2 * block`.
    pub fn set_block_timestamp(&self, block: u64, timestamp: u64) {
        self.state.lock().timestamps.insert(block, timestamp);
    }

    /// Every RPC made so far, by method name.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    /// Number of RPCs made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of RPCs of one method.
    pub fn count_of(&self, method: &str) -> usize {
        self.calls.lock().iter().filter(|m| **m == method).count()
    }

    fn record(&self, method: &'static str) -> Result<(), LedgerError> {
        self.calls.lock().push(method);
        if self.state.lock().unreachable {
            return Err(LedgerError::Network("Mock chain unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainReader for MockChainClient {
    async fn block_number(&self) -> Result<u64, LedgerError> {
        self.record("eth_blockNumber")?;
        Ok(self.state.lock().latest_block)
    }

    async fn native_balance(&self, address: Address) -> Result<U256, LedgerError> {
        self.record("eth_getBalance")?;
        Ok(self
            .state
            .lock()
            .native_balances
            .get(&address)
            .copied()
            .unwrap_or_default())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, LedgerError> {
        self.record("eth_call")?;
        let state = self.state.lock();
        let sel: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| LedgerError::revert("calldata shorter than a selector"))?;

        if let Some(err) = state.call_errors.get(&(to, sel)) {
            return Err(err.clone());
        }
        if let Some(response) = state.call_responses.get(&(to, data)) {
            return Ok(response.clone());
        }
        state
            .selector_responses
            .get(&(to, sel))
            .cloned()
            .ok_or(LedgerError::ContractRevert { reason: None })
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, LedgerError> {
        self.record("eth_getLogs")?;
        let state = self.state.lock();
        if state.fail_sent_logs && filter.topics[1].is_some() {
            return Err(LedgerError::Network("Mock sent-side log query failed".to_string()));
        }
        if state.fail_received_logs && filter.topics[2].is_some() {
            return Err(LedgerError::Network(
                "Mock received-side log query failed".to_string(),
            ));
        }
        Ok(state.logs.iter().filter(|l| filter.matches(l)).cloned().collect())
    }

    async fn block_timestamp(&self, block_number: u64) -> Result<u64, LedgerError> {
        self.record("eth_getBlockByNumber")?;
        Ok(self
            .state
            .lock()
            .timestamps
            .get(&block_number)
            .copied()
            .unwrap_or(MOCK_GENESIS_TIME + 2 * block_number))
    }
}

/// Mock wallet for testing.
pub struct MockWallet {
    session: Mutex<Option<ChainSession>>,
    sent: Mutex<Vec<CallRequest>>,
    reject_with: Mutex<Option<LedgerError>>,
}

impl MockWallet {
    /// Wallet with a live session.
    pub fn connected(address: Address, chain_id: u64) -> Self {
        Self {
            session: Mutex::new(Some(ChainSession::connected(address, chain_id))),
            sent: Mutex::new(Vec::new()),
            reject_with: Mutex::new(None),
        }
    }

    /// Wallet with no session.
    pub fn disconnected() -> Self {
        Self {
            session: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
            reject_with: Mutex::new(None),
        }
    }

    /// Replaces the session (reconnect, account switch, disconnect).
    pub fn set_session(&self, session: Option<ChainSession>) {
        *self.session.lock() = session;
    }

    /// Rejects every following broadcast with `err`; `None` accepts again.
    pub fn reject_with(&self, err: Option<LedgerError>) {
        *self.reject_with.lock() = err;
    }

    /// Every request handed to the wallet, including rejected ones.
    pub fn sent(&self) -> Vec<CallRequest> {
        self.sent.lock().clone()
    }

    /// Hash the mock assigns to the `n`-th request (0-based).
    pub fn tx_hash_for(n: usize) -> TxHash {
        let mut bytes = [0u8; 32];
        bytes[0] = 0x7e;
        bytes[24..].copy_from_slice(&(n as u64 + 1).to_be_bytes());
        TxHash::new(bytes)
    }
}

#[async_trait]
impl WalletSession for MockWallet {
    fn session(&self) -> Option<ChainSession> {
        (*self.session.lock()).and_then(ChainSession::active)
    }

    async fn send_transaction(&self, request: CallRequest) -> Result<TxHash, LedgerError> {
        let n = {
            let mut sent = self.sent.lock();
            sent.push(request);
            sent.len() - 1
        };
        match self.reject_with.lock().clone() {
            Some(err) => Err(err),
            None => Ok(Self::tx_hash_for(n)),
        }
    }
}

/// Mock image store for testing.
#[derive(Default)]
pub struct MockImageStore {
    uploads: Mutex<Vec<String>>,
    should_fail: bool,
}

impl MockImageStore {
    /// Store that accepts uploads.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose uploads always fail.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// File names uploaded so far.
    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().clone()
    }
}

#[async_trait]
impl ImageStore for MockImageStore {
    async fn upload(&self, image: &ImageFile) -> Result<String, LedgerError> {
        if self.should_fail {
            return Err(LedgerError::Network("Mock image store failure".to_string()));
        }
        let mut uploads = self.uploads.lock();
        uploads.push(image.file_name.clone());
        Ok(format!("ipfs://mock/{}", uploads.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(block: u64, topics: Vec<B256>) -> RawLog {
        RawLog {
            address: Address::new([1; 20]),
            topics,
            data: Bytes::new(),
            block_number: block,
            log_index: 0,
            tx_hash: TxHash::new([block as u8; 32]),
        }
    }

    #[test]
    fn test_filter_matches_topics_and_range() {
        let filter = LogFilter {
            address: Address::new([1; 20]),
            topics: [Some(B256::repeat_byte(0xaa)), None, Some(B256::repeat_byte(0xcc))],
            from_block: 10,
            to_block: 20,
        };
        let (a, c, d) = (
            B256::repeat_byte(0xaa),
            B256::repeat_byte(0xcc),
            B256::repeat_byte(0xdd),
        );
        assert!(filter.matches(&log(10, vec![a, B256::ZERO, c])));
        assert!(!filter.matches(&log(21, vec![a, B256::ZERO, c])));
        assert!(!filter.matches(&log(15, vec![a, B256::ZERO, d])));
        assert!(!filter.matches(&log(15, vec![a])));
    }

    #[tokio::test]
    async fn test_mock_chain_records_calls() {
        let chain = MockChainClient::new();
        chain.set_latest_block(42);
        assert_eq!(chain.block_number().await.unwrap(), 42);
        assert_eq!(chain.block_timestamp(5).await.unwrap(), MOCK_GENESIS_TIME + 10);
        assert_eq!(chain.calls(), vec!["eth_blockNumber", "eth_getBlockByNumber"]);
    }

    #[tokio::test]
    async fn test_mock_chain_unreachable() {
        let chain = MockChainClient::new();
        chain.set_unreachable(true);
        assert!(matches!(chain.block_number().await, Err(LedgerError::Network(_))));
        assert_eq!(chain.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_call_unknown_reverts() {
        let chain = MockChainClient::new();
        let data = IRewardToken::decimalsCall {}.abi_encode();
        let result = chain.call(Address::new([1; 20]), data.into()).await;
        assert!(matches!(result, Err(LedgerError::ContractRevert { .. })));
    }

    #[tokio::test]
    async fn test_mock_exact_call_beats_selector() {
        let chain = MockChainClient::new();
        let token = Address::new([2; 20]);
        let holder = Address::new([3; 20]);
        chain.set_selector_response(
            token,
            IRewardToken::balanceOfCall::SELECTOR,
            U256::from(1u64).abi_encode(),
        );
        chain.set_call_response(
            token,
            &IRewardToken::balanceOfCall { account: holder },
            U256::from(9u64).abi_encode(),
        );

        let exact = IRewardToken::balanceOfCall { account: holder }.abi_encode();
        let other = IRewardToken::balanceOfCall { account: token }.abi_encode();
        let exact = chain.call(token, exact.into()).await.unwrap();
        let other = chain.call(token, other.into()).await.unwrap();
        assert_eq!(U256::abi_decode(&exact).unwrap(), U256::from(9u64));
        assert_eq!(U256::abi_decode(&other).unwrap(), U256::from(1u64));
    }

    #[tokio::test]
    async fn test_mock_wallet_rejects() {
        let wallet = MockWallet::connected(Address::new([1; 20]), 1);
        wallet.reject_with(Some(LedgerError::revert("User rejected the request")));
        let request = CallRequest {
            from: Address::new([1; 20]),
            to: Address::new([2; 20]),
            data: Bytes::new(),
            value: U256::ZERO,
        };
        assert!(wallet.send_transaction(request).await.is_err());
        assert_eq!(wallet.sent().len(), 1);
    }

    #[test]
    fn test_mock_wallet_disconnected() {
        assert!(MockWallet::disconnected().session().is_none());
    }
}
