//! # Balance Reader
//!
//! Read-only contract and account queries. Holds nothing mutable, so any
//! number of reads may be in flight at once.

use alloy::sol_types::SolCall;
use shared_types::{Address, TokenAmount, MAX_DECIMALS, U256};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::contracts::{ContractBindings, IAchievementNft, IDonationCore, IPriceOracle, IRewardToken};
use crate::domain::{LedgerError, PriceQuote};
use crate::ports::ChainReader;

/// Read-only queries against the chain and the bound contracts.
pub struct BalanceReader<C: ChainReader> {
    chain: Arc<C>,
    bindings: Arc<ContractBindings>,
    native_decimals: u8,
}

impl<C: ChainReader> BalanceReader<C> {
    /// Create a new reader.
    pub fn new(chain: Arc<C>, bindings: Arc<ContractBindings>, native_decimals: u8) -> Self {
        Self {
            chain,
            bindings,
            native_decimals,
        }
    }

    async fn call<T: SolCall>(&self, to: Address, call: T) -> Result<T::Return, LedgerError> {
        let raw = self.chain.call(to, call.abi_encode().into()).await?;
        Ok(T::abi_decode_returns(&raw)?)
    }

    /// Native currency balance.
    pub async fn native_balance(&self, address: Address) -> Result<TokenAmount, LedgerError> {
        let wei = self
            .chain
            .native_balance(address)
            .await
            .inspect_err(|e| warn!("[ledger] Native balance read for {} failed: {}", address, e))?;
        Ok(TokenAmount::new(wei, self.native_decimals))
    }

    /// Balance of `address` on an arbitrary ERC-20 `token`, at the token's
    /// declared decimal count.
    pub async fn token_balance(&self, address: Address, token: Address) -> Result<TokenAmount, LedgerError> {
        let (balance, decimals) = futures::try_join!(
            self.call(token, IRewardToken::balanceOfCall { account: address }),
            self.decimals_of(token)
        )
        .inspect_err(|e| warn!("[ledger] Token balance read for {} failed: {}", address, e))?;

        debug!("[ledger] Token balance of {}: {} (decimals {})", address, balance, decimals);
        Ok(TokenAmount::new(balance, decimals))
    }

    /// Reward-token balance.
    pub async fn reward_balance(&self, address: Address) -> Result<TokenAmount, LedgerError> {
        self.token_balance(address, self.bindings.reward_token.address).await
    }

    /// Declared decimal count of the reward token.
    pub async fn token_decimals(&self) -> Result<u8, LedgerError> {
        self.decimals_of(self.bindings.reward_token.address).await
    }

    async fn decimals_of(&self, token: Address) -> Result<u8, LedgerError> {
        let decimals = self.call(token, IRewardToken::decimalsCall {}).await?;
        if decimals > MAX_DECIMALS {
            return Err(LedgerError::Network(format!(
                "token {} reports unsupported decimals {}",
                token, decimals
            )));
        }
        Ok(decimals)
    }

    /// Latest oracle answer, returned as an opaque integer.
    ///
    /// Only `answer` is kept from the round data. A negative answer is
    /// treated as malformed data.
    pub async fn price_quote(&self) -> Result<PriceQuote, LedgerError> {
        let round = self
            .call(self.bindings.price_oracle.address, IPriceOracle::latestRoundDataCall {})
            .await
            .inspect_err(|e| warn!("[ledger] Oracle read failed: {}", e))?;
        if round.answer.is_negative() {
            warn!("[ledger] Oracle returned a negative answer: {}", round.answer);
            return Err(LedgerError::Network(format!(
                "oracle answer is negative: {}",
                round.answer
            )));
        }
        Ok(PriceQuote(round.answer.into_raw()))
    }

    /// Whether `address` is a registered NGO.
    pub async fn is_registered(&self, address: Address) -> Result<bool, LedgerError> {
        self.call(
            self.bindings.core.address,
            IDonationCore::isNGORegisteredCall { ngo: address },
        )
        .await
    }

    /// Metadata URI of an achievement token.
    pub async fn token_uri(&self, token_id: U256) -> Result<String, LedgerError> {
        self.call(
            self.bindings.achievement_nft.address,
            IAchievementNft::tokenURICall { tokenId: token_id },
        )
        .await
    }
}
