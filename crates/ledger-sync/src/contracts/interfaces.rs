//! # Contract Interfaces
//!
//! Solidity interfaces of the four bound contracts. Calldata, return data
//! and `Transfer` logs are encoded and decoded through the generated types.

use alloy::sol;
use alloy::sol_types::{Revert, SolError};

use crate::domain::LedgerError;

sol! {
    /// Core registry and donation ledger.
    interface IDonationCore {
        function registerNGO(string name) external;
        function isNGORegistered(address ngo) external view returns (bool);
        function donate(address ngo, uint256 amount) external;
        function rewardDonor(address donor, uint256 amount) external;
        function requestTokens(uint256 amount) external;
    }

    /// Fungible reward token (ERC-20 subset).
    interface IRewardToken {
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function transfer(address to, uint256 amount) external returns (bool);

        event Transfer(address indexed from, address indexed to, uint256 value);
    }

    /// Achievement token (ERC-721 subset).
    interface IAchievementNft {
        function mintAchievement(address to, uint256 donationId, string tokenURI) external returns (uint256);
        function tokenURI(uint256 tokenId) external view returns (string);

        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
    }

    /// Price feed (Chainlink aggregator subset).
    interface IPriceOracle {
        function latestRoundData() external view returns (
            uint80 roundId,
            int256 answer,
            uint256 startedAt,
            uint256 updatedAt,
            uint80 answeredInRound
        );
    }
}

impl From<alloy::sol_types::Error> for LedgerError {
    fn from(err: alloy::sol_types::Error) -> Self {
        LedgerError::Network(format!("malformed contract response: {err}"))
    }
}

/// Reason string of `Error(string)` revert data.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    Revert::abi_decode(data).ok().map(|revert| revert.reason)
}
