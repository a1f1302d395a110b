//! # NFT Ownership Replay
//!
//! Derives which achievement tokens an account currently holds from the
//! `Transfer` logs touching it inside the history window.

use std::collections::HashMap;

use shared_types::{Address, U256};

use crate::domain::TransferEvent;

/// A token the account holds, with the transfer that brought it in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedToken {
    /// ERC-721 token id.
    pub token_id: U256,
    /// Latest inbound transfer (the mint, for tokens minted to the account).
    pub acquired: TransferEvent,
}

/// Replays transfers in ascending `(block, logIndex)` order and keeps the
/// tokens whose last observed transfer went to `account`.
///
/// Result is newest acquisition first.
pub fn current_holdings(mut events: Vec<TransferEvent>, account: Address) -> Vec<OwnedToken> {
    events.sort_by_key(TransferEvent::position);
    events.dedup_by_key(|e| e.key());

    let mut last_transfer: HashMap<U256, TransferEvent> = HashMap::new();
    for event in events {
        last_transfer.insert(event.value, event);
    }

    let mut owned: Vec<_> = last_transfer
        .into_iter()
        .filter(|(_, event)| event.to == account)
        .map(|(token_id, acquired)| OwnedToken { token_id, acquired })
        .collect();
    owned.sort_by(|a, b| b.acquired.position().cmp(&a.acquired.position()));
    owned
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::TxHash;

    const ME: Address = Address::new([0xaa; 20]);
    const OTHER: Address = Address::new([0xbb; 20]);

    fn transfer(token: u64, block: u64, from: Address, to: Address) -> TransferEvent {
        TransferEvent {
            contract: Address::new([0xc3; 20]),
            from,
            to,
            value: U256::from(token),
            block_number: block,
            log_index: 0,
            tx_hash: TxHash::new([block as u8; 32]),
        }
    }

    #[test]
    fn test_minted_token_is_owned() {
        let owned = current_holdings(vec![transfer(1, 10, Address::ZERO, ME)], ME);
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].token_id, U256::from(1u64));
    }

    #[test]
    fn test_sent_away_token_is_not_owned() {
        // Delivered out of order on purpose.
        let events = vec![transfer(1, 12, ME, OTHER), transfer(1, 10, Address::ZERO, ME)];
        assert!(current_holdings(events, ME).is_empty());
    }

    #[test]
    fn test_returned_token_is_owned_again() {
        let events = vec![
            transfer(4, 10, Address::ZERO, ME),
            transfer(4, 11, ME, OTHER),
            transfer(4, 12, OTHER, ME),
        ];
        let owned = current_holdings(events, ME);
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].acquired.block_number, 12);
    }

    #[test]
    fn test_newest_acquisition_first() {
        let events = vec![transfer(1, 10, Address::ZERO, ME), transfer(2, 20, Address::ZERO, ME)];
        let owned = current_holdings(events, ME);
        assert_eq!(owned[0].token_id, U256::from(2u64));
    }
}
