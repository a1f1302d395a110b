//! Shared harness for the integration flows.

use std::sync::Arc;

use alloy::primitives::Bytes;
use alloy::sol_types::{SolEvent, SolValue};
use ledger_sync::contracts::{IAchievementNft, IRewardToken};
use ledger_sync::{
    ContractBindings, ImageStore, LedgerService, LedgerSyncConfig, MockChainClient,
    MockImageStore, MockWallet, RawLog,
};
use shared_types::{pow10, Address, TxHash, B256, U256};

/// Session account.
pub const ME: Address = Address::new([0xaa; 20]);
/// Another marketplace participant.
pub const NGO: Address = Address::new([0xbb; 20]);
/// A third account.
pub const DONOR: Address = Address::new([0xcc; 20]);

/// A wired service plus handles on its mocks.
pub struct Harness {
    pub service: LedgerService<MockChainClient, MockWallet>,
    pub chain: Arc<MockChainClient>,
    pub wallet: Arc<MockWallet>,
    pub images: Option<Arc<MockImageStore>>,
    pub bindings: ContractBindings,
    pub config: LedgerSyncConfig,
}

impl Harness {
    /// Connected session on the configured chain, reward token with 18
    /// decimals, no image store.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Same as [`Harness::new`] with an image store.
    pub fn with_image_store(store: MockImageStore) -> Self {
        Self::build(Some(Arc::new(store)))
    }

    fn build(images: Option<Arc<MockImageStore>>) -> Self {
        let config = LedgerSyncConfig::for_testing();
        let bindings = ContractBindings::for_testing();
        let chain = Arc::new(MockChainClient::new());
        chain.set_latest_block(1_000);
        chain.set_decimals(bindings.reward_token.address, 18);
        let wallet = Arc::new(MockWallet::connected(ME, config.chain_id));
        let store = images.clone().map(|s| s as Arc<dyn ImageStore>);
        let service = LedgerService::new(
            config.clone(),
            bindings.clone(),
            chain.clone(),
            wallet.clone(),
            store,
        );
        Self {
            service,
            chain,
            wallet,
            images,
            bindings,
            config,
        }
    }

    /// Reward-token address.
    pub fn token(&self) -> Address {
        self.bindings.reward_token.address
    }

    /// Achievement NFT address.
    pub fn nft(&self) -> Address {
        self.bindings.achievement_nft.address
    }

    /// Emits a reward-token `Transfer` of `whole` tokens.
    pub fn token_transfer(&self, from: Address, to: Address, whole: u64, block: u64, index: u64, tx: TxHash) {
        self.chain.push_log(RawLog {
            address: self.token(),
            topics: vec![IRewardToken::Transfer::SIGNATURE_HASH, from.into_word(), to.into_word()],
            data: (U256::from(whole) * pow10(18)).abi_encode().into(),
            block_number: block,
            log_index: index,
            tx_hash: tx,
        });
    }

    /// Emits an achievement `Transfer` of `token_id`.
    pub fn nft_transfer(&self, from: Address, to: Address, token_id: u64, block: u64, tx: TxHash) {
        self.chain.push_log(RawLog {
            address: self.nft(),
            topics: vec![
                IAchievementNft::Transfer::SIGNATURE_HASH,
                from.into_word(),
                to.into_word(),
                B256::from(U256::from(token_id).to_be_bytes::<32>()),
            ],
            data: Bytes::new(),
            block_number: block,
            log_index: 0,
            tx_hash: tx,
        });
    }

    /// Makes `tokenURI(token_id)` return `uri`.
    pub fn set_token_uri(&self, token_id: u64, uri: &str) {
        let call = IAchievementNft::tokenURICall {
            tokenId: U256::from(token_id),
        };
        self.chain
            .set_call_response(self.nft(), &call, uri.to_string().abi_encode());
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic transaction hash.
pub fn tx(n: u8) -> TxHash {
    TxHash::new([n; 32])
}
