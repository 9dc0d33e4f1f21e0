/// End-to-end walks through the ledger layer using the factory-built mock
#[cfg(test)]
mod ledger_flow_tests {
    use crate::error::TrustSealError;
    use crate::evidence::blockchain::{
        BlockchainConfig, BlockchainConfigBuilder, ConfirmationStatus, LedgerClient,
        LedgerClientFactory,
    };
    use crate::evidence::{Digest, MetadataBuilder};
    use std::io::Write;
    use std::time::Duration;

    #[tokio::test]
    async fn test_full_workflow_with_file_digest() {
        // 1. Hash a document on disk
        let mut document = tempfile::NamedTempFile::new().unwrap();
        document.write_all(b"signed lease agreement").unwrap();
        let digest = Digest::of_file(document.path()).unwrap();
        assert_eq!(digest, Digest::of_bytes(b"signed lease agreement"));

        // 2. Describe it
        let metadata = MetadataBuilder::new()
            .file_name("lease.pdf")
            .file_size(22)
            .submitter_email("legal@example.com")
            .service_type("legal")
            .client_info("integration-test")
            .build();

        // 3. Anchor it
        let ledger = LedgerClientFactory::create(&BlockchainConfig::default(), None).unwrap();
        let cost = ledger.estimate_cost(&digest, &metadata).await.unwrap();
        assert!(cost.gas_limit > 0);

        let unsigned = ledger
            .build_transaction(&digest, &metadata, &cost)
            .await
            .unwrap();
        assert_eq!(unsigned.digest, digest);

        let signed = ledger.sign(unsigned).unwrap();
        let submitted = ledger.submit(&signed).await.unwrap();
        assert_eq!(submitted.tx_id, signed.tx_id);

        let receipt = ledger
            .await_confirmation(&submitted, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(receipt.tx_id, signed.tx_id);

        // 4. Look it up again
        match ledger.transaction_status(&receipt.tx_id).await.unwrap() {
            ConfirmationStatus::Confirmed(found) => assert_eq!(found, receipt),
            other => panic!("Expected confirmed status, got {:?}", other),
        }
        assert!(ledger
            .verification_reference(&receipt.tx_id)
            .ends_with(&format!("/tx/{}", receipt.tx_id)));
    }

    #[tokio::test]
    async fn test_configured_payload_limit_reaches_ledger() {
        let config = BlockchainConfigBuilder::new()
            .max_payload_bytes(32)
            .build()
            .unwrap();
        let ledger = LedgerClientFactory::create(&config, None).unwrap();

        let digest = Digest::of_bytes(b"x");
        let metadata = MetadataBuilder::new().file_name("report.pdf").build();

        let err = ledger.estimate_cost(&digest, &metadata).await.unwrap_err();
        match err {
            TrustSealError::PayloadTooLarge { size, limit } => {
                assert_eq!(limit, 32);
                assert_eq!(size, metadata.to_payload().len());
            }
            other => panic!("Expected PayloadTooLarge, got {:?}", other),
        }
    }
}
