pub mod config;
pub mod config_builder;
pub mod ethereum;
pub mod factory;
pub mod mock;
pub mod nonce;
pub mod types;
pub mod wallet;

#[cfg(test)]
mod tests;

pub use config::{BlockchainConfig, BlockchainEnvironment, ChainConfig, LedgerTiming, WalletConfig};
pub use config_builder::BlockchainConfigBuilder;
pub use ethereum::EthereumLedger;
pub use factory::LedgerClientFactory;
pub use mock::{ConfirmationBehavior, MockCalls, MockLedger, MOCK_GAS_USED};
pub use nonce::NonceManager;
pub use types::{
    is_valid_tx_id, ConfirmationStatus, CostEstimate, SignedTransaction, SubmittedTransaction,
    TransactionReceipt, UnsignedTransaction,
};
pub use wallet::{KeySource, LedgerCredentials, WalletManager};

use crate::error::TrustSealResult;
use crate::evidence::{Digest, Metadata};
use async_trait::async_trait;
use std::time::Duration;

/// Capability over a remote ledger network that can anchor a digest with metadata
///
/// One notarization walks the operations in order:
/// `estimate_cost → build_transaction → sign → submit → await_confirmation`.
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Human-readable network name (for logs and health output)
    fn network_name(&self) -> &str;

    /// Quote the fee for a transaction carrying this payload
    async fn estimate_cost(&self, digest: &Digest, metadata: &Metadata)
        -> TrustSealResult<CostEstimate>;

    /// Construct the notary contract call
    async fn build_transaction(
        &self,
        digest: &Digest,
        metadata: &Metadata,
        cost: &CostEstimate,
    ) -> TrustSealResult<UnsignedTransaction>;

    /// Sign with the held private key; never touches the network
    fn sign(&self, transaction: UnsignedTransaction) -> TrustSealResult<SignedTransaction>;

    /// Broadcast a signed transaction
    async fn submit(&self, transaction: &SignedTransaction)
        -> TrustSealResult<SubmittedTransaction>;

    /// Wait until the transaction is included or `timeout` elapses
    async fn await_confirmation(
        &self,
        submitted: &SubmittedTransaction,
        timeout: Duration,
    ) -> TrustSealResult<TransactionReceipt>;

    /// Look up the current status of a transaction id
    async fn transaction_status(&self, tx_id: &str) -> TrustSealResult<ConfirmationStatus>;

    /// Whether the ledger connection is currently usable
    async fn is_connected(&self) -> bool;

    /// Public explorer link for a transaction
    fn verification_reference(&self, tx_id: &str) -> String;
}
