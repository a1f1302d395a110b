//! # Write Flows
//!
//! Validation gates, wallet broadcast and optimistic feed entries, driven
//! through `LedgerClientApi` the way the UI calls it.
//!
//! ## Flows Tested:
//!
//! 1. **Gate order**: session, then recipient, then amount, then decimals read
//! 2. **Optimistic record**: pending before broadcast, failed on rejection
//! 3. **Reconciliation**: the confirmed log replaces the pending entry
//! 4. **NFT mint**: image upload, placeholder fallback, pending NFT record

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{tx, Harness, ME, NGO};
    use alloy::sol_types::{SolCall, SolValue};
    use ledger_sync::contracts::{IAchievementNft, IDonationCore, IRewardToken};
    use ledger_sync::{
        Direction, DonationId, ImageFile, ImageRef, LedgerClientApi, LedgerError, MockImageStore,
        NftMetadata, NftStatus, TxStatus, WriteReport,
    };
    use shared_types::{pow10, ChainSession, U256};

    fn image() -> ImageFile {
        ImageFile::new("meal.png", "image/png", vec![0x89, 0x50, 0x4e, 0x47])
    }

    // =============================================================================
    // VALIDATION GATES
    // =============================================================================

    #[tokio::test]
    async fn test_invalid_amounts_make_no_network_calls() {
        let h = Harness::new();
        let recipient = NGO.to_string();

        for amount in ["-5", "0", "0.000", "", "abc", "1e18", "1.2.3"] {
            let result = h.service.donate(&recipient, amount).await;
            assert!(
                matches!(result, Err(LedgerError::Validation(_))),
                "amount {amount:?} should be rejected, got {result:?}"
            );
        }

        assert_eq!(h.chain.call_count(), 0);
        assert!(h.wallet.sent().is_empty());
        assert!(h.service.transaction_feed().is_empty());
    }

    #[tokio::test]
    async fn test_bad_recipient_rejected_before_amount() {
        let h = Harness::new();
        let zero = shared_types::Address::ZERO.to_string();
        for recipient in ["", "0x1234", "not-an-address", zero.as_str()] {
            let result = h.service.transfer_tokens(recipient, "1").await;
            assert!(matches!(result, Err(LedgerError::Validation(_))));
        }
        assert_eq!(h.chain.call_count(), 0);
    }

    #[tokio::test]
    async fn test_disconnected_wallet_blocks_every_write() {
        let h = Harness::new();
        h.wallet.set_session(None);

        assert!(matches!(h.service.register_ngo("Food Bank").await, Err(LedgerError::NotConnected)));
        assert!(matches!(h.service.request_tokens("1").await, Err(LedgerError::NotConnected)));
        assert!(matches!(
            h.service.donate(&NGO.to_string(), "-5").await,
            Err(LedgerError::NotConnected)
        ));
        assert!(matches!(
            h.service
                .mint_achievement(DonationId(U256::from(1u64)), NftMetadata::new("First meal", ""), image())
                .await,
            Err(LedgerError::NotConnected)
        ));

        assert_eq!(h.chain.call_count(), 0);
        assert!(h.wallet.sent().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_chain_rejected() {
        let h = Harness::new();
        h.wallet.set_session(Some(ChainSession::connected(ME, 1)));

        let result = h.service.request_tokens("1").await;
        match result {
            Err(LedgerError::WrongChain { expected, actual }) => {
                assert_eq!(expected, h.config.chain_id);
                assert_eq!(actual, 1);
            }
            other => panic!("expected WrongChain, got {other:?}"),
        }
        assert!(h.wallet.sent().is_empty());
    }

    #[tokio::test]
    async fn test_too_many_decimals_rejected_after_decimals_read() {
        let h = Harness::new();
        h.chain.set_decimals(h.token(), 2);

        let result = h.service.request_tokens("1.005").await;
        assert!(matches!(result, Err(LedgerError::Validation(_))));
        assert_eq!(h.chain.count_of("eth_call"), 1);
        assert!(h.wallet.sent().is_empty());
    }

    // =============================================================================
    // BROADCAST AND OPTIMISTIC RECORDS
    // =============================================================================

    #[tokio::test]
    async fn test_donation_scaled_and_recorded_pending() {
        let h = Harness::new();
        let receipt = h.service.donate(&NGO.to_string(), "2.5").await.unwrap();

        let sent = h.wallet.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from, ME);
        assert_eq!(sent[0].to, h.bindings.core.address);
        let call = IDonationCore::donateCall::abi_decode(&sent[0].data).unwrap();
        assert_eq!(call.ngo, NGO);
        assert_eq!(call.amount, U256::from(25u64) * pow10(17));

        let feed = h.service.transaction_feed();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].status, TxStatus::Pending);
        assert_eq!(feed[0].direction, Direction::Spent);
        assert_eq!(feed[0].counterparty, NGO);
        assert_eq!(feed[0].amount.to_string(), "2.5");
        assert_eq!(feed[0].tx_hash, Some(receipt.tx_hash));
    }

    #[tokio::test]
    async fn test_rejected_broadcast_marks_record_failed() {
        let h = Harness::new();
        h.wallet
            .reject_with(Some(LedgerError::revert("ERC20: transfer amount exceeds balance")));

        let result = h.service.transfer_tokens(&NGO.to_string(), "3").await;
        let report = WriteReport::from(&result);
        assert!(!report.ok);
        assert_eq!(report.error_kind, Some("contract_revert"));
        assert!(report
            .error
            .as_deref()
            .is_some_and(|e| e.contains("exceeds balance")));

        let feed = h.service.transaction_feed();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].status, TxStatus::Failed);
        assert_eq!(feed[0].tx_hash, None);
    }

    #[tokio::test]
    async fn test_transport_failure_after_handoff_keeps_record_pending() {
        let h = Harness::new();
        h.wallet
            .reject_with(Some(LedgerError::Network("connection reset after send".to_string())));

        let report = WriteReport::from(&h.service.transfer_tokens(&NGO.to_string(), "1").await);
        assert!(!report.ok);
        assert_eq!(report.error_kind, Some("network"));

        let feed = h.service.transaction_feed();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].status, TxStatus::Pending);
    }

    #[tokio::test]
    async fn test_concurrent_writes_each_get_a_record() {
        let h = Harness::new();
        let recipient = NGO.to_string();
        let (a, b, c) = tokio::join!(
            h.service.donate(&recipient, "1"),
            h.service.request_tokens("2"),
            h.service.transfer_tokens(&recipient, "3"),
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());

        let feed = h.service.transaction_feed();
        assert_eq!(feed.len(), 3);
        assert!(feed.iter().all(|r| r.status == TxStatus::Pending));
        assert_eq!(h.wallet.sent().len(), 3);
    }

    #[tokio::test]
    async fn test_pending_reconciled_by_confirmed_log() {
        let h = Harness::new();
        let receipt = h.service.request_tokens("5").await.unwrap();
        h.token_transfer(shared_types::Address::ZERO, ME, 5, 990, 0, receipt.tx_hash);
        h.token_transfer(NGO, ME, 1, 950, 3, tx(9));

        let warnings = h.service.refresh_history().await.unwrap();
        assert!(warnings.is_empty());

        let feed = h.service.transaction_feed();
        assert_eq!(feed.len(), 2);
        assert!(feed.iter().all(|r| r.status == TxStatus::Completed));
        assert_eq!(feed[0].tx_hash, Some(receipt.tx_hash));
        assert_eq!(feed[0].direction, Direction::Earned);
        assert_eq!(feed[1].direction, Direction::Received);
    }

    #[tokio::test]
    async fn test_transfer_guard_uses_snapshot() {
        let h = Harness::new();
        h.chain.set_native_balance(ME, pow10(18));
        h.chain.set_selector_response(
            h.token(),
            IRewardToken::balanceOfCall::SELECTOR,
            (U256::from(2u64) * pow10(18)).abi_encode(),
        );
        let snapshot = h.service.balance_snapshot().await.unwrap();
        assert_eq!(snapshot.token.to_string(), "2");

        let result = h.service.transfer_tokens(&NGO.to_string(), "2.000000000000000001").await;
        assert!(matches!(result, Err(LedgerError::Validation(_))));
        assert!(h.wallet.sent().is_empty());

        assert!(h.service.transfer_tokens(&NGO.to_string(), "2").await.is_ok());
    }

    #[tokio::test]
    async fn test_registration_refreshed_after_broadcast() {
        let h = Harness::new();
        h.chain.set_selector_response(
            h.bindings.core.address,
            IDonationCore::isNGORegisteredCall::SELECTOR,
            true.abi_encode(),
        );
        assert_eq!(h.service.registration_status(), None);

        h.service.register_ngo("  Community Pantry ").await.unwrap();
        assert_eq!(h.service.registration_status(), Some(true));
        assert!(matches!(h.service.register_ngo("   ").await, Err(LedgerError::Validation(_))));
    }

    // =============================================================================
    // NFT MINT
    // =============================================================================

    #[tokio::test]
    async fn test_mint_uploads_image_and_adds_pending_nft() {
        let h = Harness::with_image_store(MockImageStore::new());
        let metadata = NftMetadata::new("First meal", "Donated 10 meals");

        let receipt = h
            .service
            .mint_achievement(DonationId(U256::from(42u64)), metadata, image())
            .await
            .unwrap();

        let images = h.images.as_ref().unwrap();
        assert_eq!(images.uploads(), vec!["meal.png".to_string()]);

        let sent = h.wallet.sent();
        assert_eq!(sent[0].to, h.nft());
        let call = IAchievementNft::mintAchievementCall::abi_decode(&sent[0].data).unwrap();
        assert_eq!(call.to, ME);
        assert_eq!(call.donationId, U256::from(42u64));

        let nfts = h.service.owned_nfts();
        assert_eq!(nfts.len(), 1);
        assert_eq!(nfts[0].status, NftStatus::Unconfirmed);
        assert_eq!(nfts[0].token_id, None);
        assert_eq!(nfts[0].mint_tx_hash, receipt.tx_hash);
        assert_eq!(nfts[0].image_ref, ImageRef::Remote("ipfs://mock/1".to_string()));
    }

    #[tokio::test]
    async fn test_mint_without_store_uses_placeholder() {
        let h = Harness::new();
        h.service
            .mint_achievement(DonationId(U256::from(1u64)), NftMetadata::new("Helper", ""), image())
            .await
            .unwrap();

        let nfts = h.service.owned_nfts();
        assert!(nfts[0].image_ref.is_placeholder());
        assert_eq!(nfts[0].image_ref.uri(), h.config.placeholder_image_uri);
    }

    #[tokio::test]
    async fn test_failed_upload_aborts_mint() {
        let h = Harness::with_image_store(MockImageStore::failing());
        let result = h
            .service
            .mint_achievement(DonationId(U256::from(1u64)), NftMetadata::new("Helper", ""), image())
            .await;

        assert!(matches!(result, Err(LedgerError::Network(_))));
        assert!(h.wallet.sent().is_empty());
        assert!(h.service.owned_nfts().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_mint_adds_no_nft() {
        let h = Harness::new();
        h.wallet.reject_with(Some(LedgerError::revert("User denied transaction signature")));
        let result = h
            .service
            .mint_achievement(DonationId(U256::from(1u64)), NftMetadata::new("Helper", ""), image())
            .await;

        assert!(matches!(result, Err(LedgerError::ContractRevert { .. })));
        assert!(h.service.owned_nfts().is_empty());
    }
}
