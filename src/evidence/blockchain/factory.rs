use super::{
    BlockchainConfig, BlockchainEnvironment, EthereumLedger, LedgerClient, LedgerCredentials,
    MockLedger, WalletManager,
};
use crate::error::{TrustSealError, TrustSealResult};
use std::sync::Arc;
use tracing::{info, warn};

/// Factory for creating ledger client instances
///
/// Picks the `LedgerClient` implementation from the configured environment so
/// the service never names a concrete ledger.
pub struct LedgerClientFactory;

impl LedgerClientFactory {
    /// Create a ledger client from blockchain configuration
    ///
    /// # Arguments
    /// * `config` - The blockchain configuration
    /// * `credentials` - Signing credentials; ignored by the mock
    ///
    /// # Errors
    /// Returns an error if:
    /// - Credentials are missing for a non-Mock environment
    /// - The key does not derive the configured wallet address
    /// - The RPC client cannot be initialised
    pub fn create(
        config: &BlockchainConfig,
        credentials: Option<LedgerCredentials>,
    ) -> TrustSealResult<Arc<dyn LedgerClient>> {
        match config.environment {
            BlockchainEnvironment::Mock => {
                if credentials.is_some() {
                    warn!("Signing key supplied but the mock ledger is configured; key unused");
                }
                info!(network = %config.chain.name, "Using mock ledger");
                Ok(Arc::new(
                    MockLedger::with_chain(config.chain.clone(), 0)
                        .with_max_payload_bytes(config.max_payload_bytes),
                ))
            }
            BlockchainEnvironment::Testnet | BlockchainEnvironment::Mainnet => {
                let credentials = credentials.ok_or_else(|| {
                    TrustSealError::BlockchainNotConfigured(
                        "No signing key configured for non-Mock environment".to_string(),
                    )
                })?;

                if let Some(wallet) = &config.wallet {
                    WalletManager::verify_address(&credentials, &wallet.address)?;
                }

                Ok(Arc::new(EthereumLedger::new(config.clone(), credentials)?))
            }
        }
    }
}
