//! # History Flows
//!
//! Transfer-log history and achievement ownership rebuilt through the
//! service, including partial and failed fetches.
//!
//! ## Flows Tested:
//!
//! 1. **Two-sided query**: sent and received logs merged, deduplicated, ordered
//! 2. **Partial fetch**: one side failing keeps the other with a warning
//! 3. **Total failure**: both sides failing leaves the cache untouched
//! 4. **Session switch**: the cache never serves another account's history
//! 5. **NFT ownership**: mint reconciliation, transfers out, tokenURI fallback

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{tx, Harness, DONOR, ME, NGO};
    use ledger_sync::{
        invariant_history_ordered, invariant_unique_events, Direction, DonationId, ImageFile,
        ImageRef, LedgerClientApi, LedgerError, NftMetadata, NftStatus, QuerySide, RawLog,
        TxStatus,
    };
    use alloy::primitives::Bytes;
    use alloy::sol_types::SolEvent;
    use ledger_sync::contracts::IRewardToken;
    use proptest::prelude::*;
    use shared_types::{Address, ChainSession, U256};

    // =============================================================================
    // TRANSFER HISTORY
    // =============================================================================

    #[tokio::test]
    async fn test_history_merges_both_sides_newest_first() {
        let h = Harness::new();
        h.token_transfer(Address::ZERO, ME, 10, 910, 0, tx(1));
        h.token_transfer(ME, NGO, 4, 950, 1, tx(2));
        h.token_transfer(DONOR, ME, 2, 950, 4, tx(3));
        h.token_transfer(DONOR, NGO, 7, 960, 0, tx(4));

        let warnings = h.service.refresh_history().await.unwrap();
        assert!(warnings.is_empty());

        let feed = h.service.transaction_feed();
        let directions: Vec<_> = feed.iter().map(|r| r.direction).collect();
        assert_eq!(
            directions,
            vec![Direction::Received, Direction::Spent, Direction::Earned]
        );
        assert_eq!(feed[1].counterparty, NGO);
        assert_eq!(feed[1].amount.to_string(), "4");
        assert_eq!(feed[0].counterparty, DONOR);
        assert_eq!(feed[2].counterparty, Address::ZERO);
        assert!(invariant_history_ordered(&feed));
        assert!(invariant_unique_events(&feed));
    }

    #[tokio::test]
    async fn test_self_transfer_appears_once() {
        let h = Harness::new();
        h.token_transfer(ME, ME, 1, 920, 0, tx(5));

        h.service.refresh_history().await.unwrap();
        let feed = h.service.transaction_feed();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].direction, Direction::Spent);
    }

    #[tokio::test]
    async fn test_logs_outside_window_ignored() {
        let h = Harness::new();
        h.token_transfer(NGO, ME, 1, 900, 0, tx(1));
        h.token_transfer(NGO, ME, 1, 901, 0, tx(2));

        h.service.refresh_history().await.unwrap();
        let feed = h.service.transaction_feed();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].block_number, Some(901));
    }

    #[tokio::test]
    async fn test_block_timestamps_fetched_once_per_block() {
        let h = Harness::new();
        h.chain.set_block_timestamp(930, 1_750_000_000);
        h.token_transfer(NGO, ME, 1, 930, 0, tx(1));
        h.token_transfer(NGO, ME, 2, 930, 1, tx(2));
        h.token_transfer(NGO, ME, 3, 931, 0, tx(3));

        h.service.refresh_history().await.unwrap();
        assert_eq!(h.chain.count_of("eth_getBlockByNumber"), 2);
        let feed = h.service.transaction_feed();
        assert!(feed
            .iter()
            .filter(|r| r.block_number == Some(930))
            .all(|r| r.timestamp == 1_750_000_000));
    }

    #[tokio::test]
    async fn test_partial_fetch_keeps_other_side() {
        let h = Harness::new();
        h.token_transfer(ME, NGO, 1, 940, 0, tx(1));
        h.token_transfer(NGO, ME, 2, 941, 0, tx(2));
        h.chain.fail_received_logs(true);

        let warnings = h.service.refresh_history().await.unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            warnings[0],
            LedgerError::PartialFetch {
                side: QuerySide::Received,
                ..
            }
        ));

        let feed = h.service.transaction_feed();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].direction, Direction::Spent);
    }

    #[tokio::test]
    async fn test_partial_fetch_does_not_drop_known_records() {
        let h = Harness::new();
        h.token_transfer(ME, NGO, 1, 940, 0, tx(1));
        h.token_transfer(NGO, ME, 2, 941, 0, tx(2));
        h.service.refresh_history().await.unwrap();
        assert_eq!(h.service.transaction_feed().len(), 2);

        h.chain.fail_sent_logs(true);
        let warnings = h.service.refresh_history().await.unwrap();
        assert!(!warnings.is_empty());
        assert_eq!(h.service.transaction_feed().len(), 2);
    }

    #[tokio::test]
    async fn test_both_sides_failing_is_an_error() {
        let h = Harness::new();
        h.token_transfer(NGO, ME, 2, 941, 0, tx(2));
        h.service.refresh_history().await.unwrap();

        h.chain.fail_sent_logs(true);
        h.chain.fail_received_logs(true);
        let result = h.service.refresh_history().await;
        assert!(matches!(result, Err(LedgerError::Network(_))));
        assert_eq!(h.service.transaction_feed().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_log_becomes_warning() {
        let h = Harness::new();
        h.token_transfer(NGO, ME, 2, 941, 0, tx(2));
        h.chain.push_log(RawLog {
            address: h.token(),
            topics: vec![
                IRewardToken::Transfer::SIGNATURE_HASH,
                NGO.into_word(),
                ME.into_word(),
            ],
            data: Bytes::from_static(&[1, 2, 3]),
            block_number: 942,
            log_index: 0,
            tx_hash: tx(3),
        });

        let warnings = h.service.refresh_history().await.unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0], LedgerError::Network(_)));
        assert_eq!(h.service.transaction_feed().len(), 1);
    }

    #[tokio::test]
    async fn test_account_switch_clears_feed() {
        let h = Harness::new();
        h.token_transfer(NGO, ME, 2, 941, 0, tx(2));
        h.service.refresh_history().await.unwrap();
        h.service.request_tokens("1").await.unwrap();
        assert_eq!(h.service.transaction_feed().len(), 2);

        h.wallet
            .set_session(Some(ChainSession::connected(DONOR, h.config.chain_id)));
        assert!(h.service.transaction_feed().is_empty());

        h.service.refresh_history().await.unwrap();
        assert!(h.service.transaction_feed().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_stays_above_confirmed_history() {
        let h = Harness::new();
        h.token_transfer(NGO, ME, 2, 941, 0, tx(2));
        h.service.refresh_history().await.unwrap();

        h.wallet.reject_with(Some(LedgerError::revert("nope")));
        let _ = h.service.request_tokens("1").await;
        h.wallet.reject_with(None);
        h.service.request_tokens("3").await.unwrap();

        let statuses: Vec<_> = h
            .service
            .transaction_feed()
            .iter()
            .map(|r| r.status)
            .collect();
        assert_eq!(
            statuses,
            vec![TxStatus::Pending, TxStatus::Failed, TxStatus::Completed]
        );
    }

    // =============================================================================
    // ACHIEVEMENT NFTS
    // =============================================================================

    #[tokio::test]
    async fn test_minted_nft_reconciled_by_tx_hash() {
        let h = Harness::new();
        let receipt = h
            .service
            .mint_achievement(
                DonationId(U256::from(7u64)),
                NftMetadata::new("First meal", "Fed a family"),
                ImageFile::new("meal.png", "image/png", vec![1]),
            )
            .await
            .unwrap();
        assert_eq!(h.service.owned_nfts()[0].status, NftStatus::Unconfirmed);

        h.nft_transfer(Address::ZERO, ME, 3, 970, receipt.tx_hash);
        h.set_token_uri(
            3,
            r#"{"name":"First meal","description":"Fed a family","image":"ipfs://bafy-meal"}"#,
        );

        let warnings = h.service.refresh_nfts().await.unwrap();
        assert!(warnings.is_empty());

        let nfts = h.service.owned_nfts();
        assert_eq!(nfts.len(), 1);
        assert_eq!(nfts[0].status, NftStatus::Confirmed);
        assert_eq!(nfts[0].token_id, Some(U256::from(3u64)));
        assert_eq!(nfts[0].metadata.name, "First meal");
        assert_eq!(nfts[0].image_ref, ImageRef::Remote("ipfs://bafy-meal".to_string()));
    }

    #[tokio::test]
    async fn test_transferred_away_nft_not_owned() {
        let h = Harness::new();
        h.nft_transfer(Address::ZERO, ME, 1, 910, tx(1));
        h.nft_transfer(Address::ZERO, ME, 2, 911, tx(2));
        h.nft_transfer(ME, NGO, 1, 950, tx(3));
        h.set_token_uri(2, r#"{"name":"Helper","description":""}"#);

        h.service.refresh_nfts().await.unwrap();
        let nfts = h.service.owned_nfts();
        assert_eq!(nfts.len(), 1);
        assert_eq!(nfts[0].token_id, Some(U256::from(2u64)));
        assert!(nfts[0].image_ref.is_placeholder());
    }

    #[tokio::test]
    async fn test_token_uri_failure_falls_back() {
        let h = Harness::new();
        h.nft_transfer(Address::ZERO, ME, 5, 910, tx(1));

        let warnings = h.service.refresh_nfts().await.unwrap();
        assert_eq!(warnings.len(), 1);
        let nfts = h.service.owned_nfts();
        assert_eq!(nfts.len(), 1);
        assert_eq!(nfts[0].metadata.name, "Achievement #5");
        assert!(nfts[0].image_ref.is_placeholder());
    }

    // =============================================================================
    // PROPERTIES
    // =============================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_feed_invariants_hold(
            transfers in proptest::collection::btree_map(
                (901u64..=1_000, 0u64..4),
                (0u8..3, 1u64..1_000),
                0..24,
            )
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let h = Harness::new();
                for (i, ((block, index), (kind, whole))) in transfers.iter().enumerate() {
                    let (from, to) = match kind {
                        0 => (Address::ZERO, ME),
                        1 => (ME, NGO),
                        _ => (DONOR, ME),
                    };
                    h.token_transfer(from, to, *whole, *block, *index, tx(i as u8));
                }

                h.service.refresh_history().await.unwrap();
                let feed = h.service.transaction_feed();
                prop_assert_eq!(feed.len(), transfers.len());
                prop_assert!(invariant_history_ordered(&feed));
                prop_assert!(invariant_unique_events(&feed));
                Ok(())
            })?;
        }
    }
}
