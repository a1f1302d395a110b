//! # Binding Validation
//!
//! Loads `{address, abi}` descriptors for the four contracts and checks,
//! before any call is made, that each ABI declares every function and event
//! the layer uses. Call sites encode through the generated interface types
//! and never consult the ABI again.

use alloy::json_abi::JsonAbi;
use serde::Deserialize;
use shared_types::Address;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use tracing::info;

use crate::domain::BindingError;

/// Canonical signatures used by the layer.
pub mod sig {
    use alloy::sol_types::{SolCall, SolEvent};

    use crate::contracts::interfaces::{IAchievementNft, IDonationCore, IPriceOracle, IRewardToken};

    /// Core: register the caller as an NGO.
    pub const REGISTER_NGO: &str = IDonationCore::registerNGOCall::SIGNATURE;
    /// Core: registration lookup.
    pub const IS_NGO_REGISTERED: &str = IDonationCore::isNGORegisteredCall::SIGNATURE;
    /// Core: record a donation.
    pub const DONATE: &str = IDonationCore::donateCall::SIGNATURE;
    /// Core: reward a donor with tokens.
    pub const REWARD_DONOR: &str = IDonationCore::rewardDonorCall::SIGNATURE;
    /// Core: request tokens for the caller.
    pub const REQUEST_TOKENS: &str = IDonationCore::requestTokensCall::SIGNATURE;

    /// Token: balance lookup.
    pub const BALANCE_OF: &str = IRewardToken::balanceOfCall::SIGNATURE;
    /// Token: decimal count.
    pub const DECIMALS: &str = IRewardToken::decimalsCall::SIGNATURE;
    /// Token: transfer.
    pub const TRANSFER: &str = IRewardToken::transferCall::SIGNATURE;

    /// NFT: mint an achievement for a donation.
    pub const MINT_ACHIEVEMENT: &str = IAchievementNft::mintAchievementCall::SIGNATURE;
    /// NFT: metadata lookup.
    pub const TOKEN_URI: &str = IAchievementNft::tokenURICall::SIGNATURE;

    /// Oracle: latest round.
    pub const LATEST_ROUND_DATA: &str = IPriceOracle::latestRoundDataCall::SIGNATURE;

    /// ERC-20 and ERC-721 transfer event.
    pub const TRANSFER_EVENT: &str = IRewardToken::Transfer::SIGNATURE;
}

/// Canonical function and event signatures declared by a contract ABI.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AbiDescriptor {
    functions: BTreeSet<String>,
    events: BTreeSet<String>,
}

impl AbiDescriptor {
    /// Parses a standard JSON ABI array.
    pub fn from_json(abi: &serde_json::Value) -> Result<Self, serde_json::Error> {
        let abi: JsonAbi = serde_json::from_value(abi.clone())?;
        Ok(Self {
            functions: abi.functions().map(|f| f.signature()).collect(),
            events: abi.events().map(|e| e.signature()).collect(),
        })
    }

    /// Builds a descriptor straight from canonical signatures.
    pub fn from_signatures(functions: &[&str], events: &[&str]) -> Self {
        Self {
            functions: functions.iter().map(|s| s.to_string()).collect(),
            events: events.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Whether the ABI declares this function.
    pub fn has_function(&self, signature: &str) -> bool {
        self.functions.contains(signature)
    }

    /// Whether the ABI declares this event.
    pub fn has_event(&self, signature: &str) -> bool {
        self.events.contains(signature)
    }
}

/// Which external contract a binding describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContractRole {
    /// Core registry / donation ledger.
    Core,
    /// Fungible reward token.
    RewardToken,
    /// Non-fungible achievement token.
    AchievementNft,
    /// Price oracle.
    PriceOracle,
}

impl ContractRole {
    /// All roles, in document order.
    pub const ALL: [ContractRole; 4] = [
        ContractRole::Core,
        ContractRole::RewardToken,
        ContractRole::AchievementNft,
        ContractRole::PriceOracle,
    ];

    /// Functions the layer calls on this contract.
    pub fn required_functions(&self) -> &'static [&'static str] {
        match self {
            ContractRole::Core => &[
                sig::REGISTER_NGO,
                sig::IS_NGO_REGISTERED,
                sig::DONATE,
                sig::REWARD_DONOR,
                sig::REQUEST_TOKENS,
            ],
            ContractRole::RewardToken => &[sig::BALANCE_OF, sig::DECIMALS, sig::TRANSFER],
            ContractRole::AchievementNft => &[sig::MINT_ACHIEVEMENT, sig::TOKEN_URI],
            ContractRole::PriceOracle => &[sig::LATEST_ROUND_DATA],
        }
    }

    /// Events the layer indexes on this contract.
    pub fn required_events(&self) -> &'static [&'static str] {
        match self {
            ContractRole::RewardToken | ContractRole::AchievementNft => &[sig::TRANSFER_EVENT],
            ContractRole::Core | ContractRole::PriceOracle => &[],
        }
    }
}

impl fmt::Display for ContractRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContractRole::Core => "core registry",
            ContractRole::RewardToken => "reward token",
            ContractRole::AchievementNft => "achievement NFT",
            ContractRole::PriceOracle => "price oracle",
        };
        f.write_str(name)
    }
}

/// A validated contract address and its declared interface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractBinding {
    /// Role this contract plays.
    pub role: ContractRole,
    /// Deployed address.
    pub address: Address,
    /// Declared functions and events.
    pub abi: AbiDescriptor,
}

impl ContractBinding {
    fn validate(&self) -> Result<(), BindingError> {
        if self.address.is_zero() {
            return Err(BindingError::ZeroAddress(self.role));
        }
        if let Some(missing) = self
            .role
            .required_functions()
            .iter()
            .find(|s| !self.abi.has_function(s))
        {
            return Err(BindingError::MissingFunction {
                role: self.role,
                signature: missing.to_string(),
            });
        }
        if let Some(missing) = self
            .role
            .required_events()
            .iter()
            .find(|s| !self.abi.has_event(s))
        {
            return Err(BindingError::MissingEvent {
                role: self.role,
                signature: missing.to_string(),
            });
        }
        Ok(())
    }
}

/// The four bindings, immutable after [`ContractBindings::validated`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractBindings {
    /// Core registry / ledger.
    pub core: ContractBinding,
    /// Reward token.
    pub reward_token: ContractBinding,
    /// Achievement NFT.
    pub achievement_nft: ContractBinding,
    /// Price oracle.
    pub price_oracle: ContractBinding,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BindingsDocument {
    core: RawBinding,
    reward_token: RawBinding,
    achievement_nft: RawBinding,
    price_oracle: RawBinding,
}

#[derive(Deserialize)]
struct RawBinding {
    address: String,
    abi: serde_json::Value,
}

impl RawBinding {
    fn into_binding(self, role: ContractRole) -> Result<ContractBinding, BindingError> {
        let address = self
            .address
            .parse::<Address>()
            .map_err(|e| BindingError::InvalidAddress {
                role,
                reason: e.to_string(),
            })?;
        let abi = AbiDescriptor::from_json(&self.abi)
            .map_err(|e| BindingError::Malformed(format!("{role} ABI: {e}")))?;
        Ok(ContractBinding { role, address, abi })
    }
}

impl ContractBindings {
    /// Parses and validates a bindings document.
    pub fn from_json_str(json: &str) -> Result<Self, BindingError> {
        let doc: BindingsDocument =
            serde_json::from_str(json).map_err(|e| BindingError::Malformed(e.to_string()))?;

        Self {
            core: doc.core.into_binding(ContractRole::Core)?,
            reward_token: doc.reward_token.into_binding(ContractRole::RewardToken)?,
            achievement_nft: doc.achievement_nft.into_binding(ContractRole::AchievementNft)?,
            price_oracle: doc.price_oracle.into_binding(ContractRole::PriceOracle)?,
        }
        .validated()
    }

    /// Reads and validates a bindings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BindingError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| BindingError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let bindings = Self::from_json_str(&json)?;
        info!(
            "[ledger] Loaded contract bindings from {} (core {})",
            path.display(),
            bindings.core.address
        );
        Ok(bindings)
    }

    /// Runs every startup check.
    pub fn validated(self) -> Result<Self, BindingError> {
        let all = self.all();
        for binding in all {
            binding.validate()?;
        }
        for (i, first) in all.iter().enumerate() {
            if let Some(second) = all[i + 1..].iter().find(|b| b.address == first.address) {
                return Err(BindingError::DuplicateAddress {
                    first: first.role,
                    second: second.role,
                });
            }
        }
        Ok(self)
    }

    /// Bindings in role order.
    pub fn all(&self) -> [&ContractBinding; 4] {
        [
            &self.core,
            &self.reward_token,
            &self.achievement_nft,
            &self.price_oracle,
        ]
    }

    /// Binding for a role.
    pub fn get(&self, role: ContractRole) -> &ContractBinding {
        match role {
            ContractRole::Core => &self.core,
            ContractRole::RewardToken => &self.reward_token,
            ContractRole::AchievementNft => &self.achievement_nft,
            ContractRole::PriceOracle => &self.price_oracle,
        }
    }

    /// Bindings at fixed addresses `0x..c1` to `0x..c4`, declaring exactly
    /// the required interface.
    pub fn for_testing() -> Self {
        let binding = |role: ContractRole, last: u8| {
            let mut bytes = [0u8; 20];
            bytes[19] = last;
            ContractBinding {
                role,
                address: Address::new(bytes),
                abi: AbiDescriptor::from_signatures(role.required_functions(), role.required_events()),
            }
        };
        Self {
            core: binding(ContractRole::Core, 0xc1),
            reward_token: binding(ContractRole::RewardToken, 0xc2),
            achievement_nft: binding(ContractRole::AchievementNft, 0xc3),
            price_oracle: binding(ContractRole::PriceOracle, 0xc4),
        }
    }
}
