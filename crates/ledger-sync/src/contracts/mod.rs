//! # Contract Bindings
//!
//! The four external contracts the layer talks to: their Solidity
//! interfaces and the bindings validated once at startup.

pub mod binding;
pub mod interfaces;

pub use binding::{sig, AbiDescriptor, ContractBinding, ContractBindings, ContractRole};
pub use interfaces::{
    decode_revert_reason, IAchievementNft, IDonationCore, IPriceOracle, IRewardToken,
};
