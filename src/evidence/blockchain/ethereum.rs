use super::config::BlockchainConfig;
use super::nonce::NonceManager;
use super::types::{
    ConfirmationStatus, CostEstimate, SignedTransaction, SubmittedTransaction, TransactionReceipt,
    UnsignedTransaction,
};
use super::wallet::LedgerCredentials;
use super::LedgerClient;
use crate::error::{TrustSealError, TrustSealResult};
use crate::evidence::{Digest, Metadata};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use ethers::contract::abigen;
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, BlockId, BlockNumber, Bytes, TransactionRequest, H256};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

// ABI for the TrustSeal notary contract
abigen!(
    NotaryRegistry,
    r#"[
        function notarize(bytes32 documentHash, string metadata) external
        event DocumentNotarized(bytes32 indexed documentHash, address indexed submitter, string metadata, uint256 timestamp)
    ]"#
);

/// JSON-RPC error code some providers use for rate limiting
const RPC_LIMIT_EXCEEDED: i64 = -32005;

/// Ledger client for EVM chains over JSON-RPC
pub struct EthereumLedger {
    provider: Arc<Provider<Http>>,
    credentials: LedgerCredentials,
    contract_address: Address,
    config: BlockchainConfig,
    nonces: NonceManager,
}

impl EthereumLedger {
    /// Create a new Ethereum ledger client
    pub fn new(config: BlockchainConfig, credentials: LedgerCredentials) -> TrustSealResult<Self> {
        let provider = Provider::<Http>::try_from(config.chain.rpc_url.as_str())
            .map_err(|e| {
                TrustSealError::BlockchainNotConfigured(format!("Invalid RPC URL: {}", e))
            })?
            .interval(config.timing.poll_interval());

        let contract_address: Address = config.chain.contract_address.parse().map_err(|e| {
            TrustSealError::BlockchainNotConfigured(format!("Invalid contract address: {}", e))
        })?;

        let credentials = credentials.for_chain(config.chain.chain_id);

        info!(
            network = %config.chain.name,
            chain_id = config.chain.chain_id,
            contract = %config.chain.contract_address,
            account = %credentials.address_hex(),
            "Ethereum ledger client configured"
        );

        Ok(Self {
            provider: Arc::new(provider),
            credentials,
            contract_address,
            config,
            nonces: NonceManager::new(),
        })
    }

    /// ABI-encode `notarize(digest, metadata)`, enforcing the payload limit
    fn encode_call(&self, digest: &Digest, metadata: &Metadata) -> TrustSealResult<Bytes> {
        let payload = metadata.to_payload();
        if payload.len() > self.config.max_payload_bytes {
            return Err(TrustSealError::PayloadTooLarge {
                size: payload.len(),
                limit: self.config.max_payload_bytes,
            });
        }

        let contract = NotaryRegistry::new(self.contract_address, self.provider.clone());
        contract
            .notarize(digest.to_bytes32(), payload)
            .calldata()
            .ok_or_else(|| TrustSealError::Internal("Failed to encode notarize call".to_string()))
    }

    /// Run one JSON-RPC call under the configured timeout
    async fn rpc<T, Fut>(&self, label: &str, call: Fut) -> TrustSealResult<T>
    where
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let timeout = self.config.timing.rpc_timeout();
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(classify_provider_error(label, e)),
            Err(_) => Err(TrustSealError::NetworkUnavailable(format!(
                "{} timed out after {}ms",
                label,
                timeout.as_millis()
            ))),
        }
    }

    /// Like `rpc`, but every failure of a read-only call counts as a network fault
    async fn read<T, Fut>(&self, label: &str, call: Fut) -> TrustSealResult<T>
    where
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        self.rpc(label, call).await.map_err(|e| match e {
            TrustSealError::SubmissionRejected(msg) => TrustSealError::NetworkUnavailable(msg),
            other => other,
        })
    }

    async fn lookup(&self, hash: H256) -> TrustSealResult<ConfirmationStatus> {
        let receipt = self
            .read(
                "eth_getTransactionReceipt",
                self.provider.get_transaction_receipt(hash),
            )
            .await?;

        match receipt {
            Some(receipt) => self.receipt_status(receipt).await,
            None => {
                let known = self
                    .read("eth_getTransactionByHash", self.provider.get_transaction(hash))
                    .await?;
                Ok(if known.is_some() {
                    ConfirmationStatus::Pending
                } else {
                    ConfirmationStatus::Unknown
                })
            }
        }
    }

    async fn receipt_status(
        &self,
        receipt: ethers::types::TransactionReceipt,
    ) -> TrustSealResult<ConfirmationStatus> {
        if receipt.status.map(|s| s.low_u64()) == Some(0) {
            return Ok(ConfirmationStatus::Reverted);
        }

        let block_number = match receipt.block_number {
            Some(block) => block.low_u64(),
            None => return Ok(ConfirmationStatus::Pending),
        };

        let confirmations = self.config.timing.confirmations;
        if confirmations > 1 {
            let head = self
                .read("eth_blockNumber", self.provider.get_block_number())
                .await?
                .low_u64();
            if head + 1 < block_number + confirmations {
                return Ok(ConfirmationStatus::Pending);
            }
        }

        let timestamp = match self.block_timestamp(block_number).await {
            Ok(Some(timestamp)) => timestamp,
            Ok(None) => Utc::now(),
            Err(e) => {
                debug!(block = block_number, error = %e, "Block timestamp unavailable");
                Utc::now()
            }
        };

        Ok(ConfirmationStatus::Confirmed(TransactionReceipt {
            tx_id: format!("0x{:x}", receipt.transaction_hash),
            block_number: Some(block_number),
            gas_used: receipt.gas_used.map(|g| g.low_u64()).unwrap_or(0),
            timestamp,
        }))
    }

    async fn block_timestamp(&self, block_number: u64) -> TrustSealResult<Option<DateTime<Utc>>> {
        let block = self
            .read(
                "eth_getBlockByNumber",
                self.provider.get_block(BlockId::from(block_number)),
            )
            .await?;

        Ok(block.and_then(|b| {
            Utc.timestamp_opt(b.timestamp.low_u64() as i64, 0)
                .single()
        }))
    }
}

/// Map a provider failure onto the error taxonomy
///
/// A JSON-RPC error response means the node looked at the request and refused it;
/// anything else (transport, decoding) means the node could not be reached.
fn classify_provider_error(label: &str, err: ProviderError) -> TrustSealError {
    if let Some(response) = err.as_error_response() {
        if response.code == RPC_LIMIT_EXCEEDED
            || response.message.to_lowercase().contains("rate limit")
        {
            return TrustSealError::NetworkUnavailable(format!("{}: {}", label, response.message));
        }
        return TrustSealError::SubmissionRejected(format!("{}: {}", label, response.message));
    }
    TrustSealError::NetworkUnavailable(format!("{}: {}", label, err))
}

fn parse_tx_hash(tx_id: &str) -> TrustSealResult<H256> {
    tx_id
        .parse::<H256>()
        .map_err(|_| TrustSealError::InvalidTransactionId(tx_id.to_string()))
}

#[async_trait]
impl LedgerClient for EthereumLedger {
    fn network_name(&self) -> &str {
        &self.config.chain.name
    }

    async fn estimate_cost(
        &self,
        digest: &Digest,
        metadata: &Metadata,
    ) -> TrustSealResult<CostEstimate> {
        let data = self.encode_call(digest, metadata)?;
        let request: TypedTransaction = TransactionRequest::new()
            .from(self.credentials.address())
            .to(self.contract_address)
            .data(data)
            .into();

        let gas = self
            .rpc("eth_estimateGas", self.provider.estimate_gas(&request, None))
            .await?;
        let gas_price = self
            .rpc("eth_gasPrice", self.provider.get_gas_price())
            .await?;

        let cost = CostEstimate::with_headroom(gas.low_u64(), gas_price.low_u128());
        debug!(
            digest = %digest,
            gas_limit = cost.gas_limit,
            gas_price_wei = cost.gas_price_wei,
            "Estimated notarization cost"
        );
        Ok(cost)
    }

    async fn build_transaction(
        &self,
        digest: &Digest,
        metadata: &Metadata,
        cost: &CostEstimate,
    ) -> TrustSealResult<UnsignedTransaction> {
        let data = self.encode_call(digest, metadata)?;
        let account = self.credentials.address();

        let nonce = self
            .nonces
            .reserve(|| async move {
                let count = self
                    .read(
                        "eth_getTransactionCount",
                        self.provider
                            .get_transaction_count(account, Some(BlockNumber::Pending.into())),
                    )
                    .await?;
                Ok(count.low_u64())
            })
            .await?;

        Ok(UnsignedTransaction {
            digest: digest.clone(),
            to: format!("0x{:x}", self.contract_address),
            data: data.to_vec(),
            gas_limit: cost.gas_limit,
            gas_price_wei: cost.gas_price_wei,
            nonce,
            chain_id: self.config.chain.chain_id,
        })
    }

    fn sign(&self, transaction: UnsignedTransaction) -> TrustSealResult<SignedTransaction> {
        let to: Address = transaction.to.parse().map_err(|_| {
            self.nonces.mark_stale();
            TrustSealError::SigningFailed("transaction has an invalid destination".to_string())
        })?;

        let request: TypedTransaction = TransactionRequest::new()
            .from(self.credentials.address())
            .to(to)
            .data(transaction.data)
            .gas(transaction.gas_limit)
            .gas_price(transaction.gas_price_wei)
            .nonce(transaction.nonce)
            .chain_id(transaction.chain_id)
            .into();

        let signature = self
            .credentials
            .wallet()
            .sign_transaction_sync(&request)
            .map_err(|_| {
                self.nonces.mark_stale();
                TrustSealError::SigningFailed("wallet could not sign the transaction".to_string())
            })?;

        Ok(SignedTransaction {
            tx_id: format!("0x{:x}", request.hash(&signature)),
            raw: request.rlp_signed(&signature).to_vec(),
            nonce: transaction.nonce,
        })
    }

    async fn submit(
        &self,
        transaction: &SignedTransaction,
    ) -> TrustSealResult<SubmittedTransaction> {
        let raw = Bytes::from(transaction.raw.clone());
        let result = self
            .rpc("eth_sendRawTransaction", async {
                self.provider
                    .send_raw_transaction(raw)
                    .await
                    .map(|pending| *pending)
            })
            .await;

        match result {
            Ok(hash) => {
                let broadcast_id = format!("0x{:x}", hash);
                if broadcast_id != transaction.tx_id {
                    warn!(
                        expected = %transaction.tx_id,
                        reported = %broadcast_id,
                        "Node reported a different transaction hash"
                    );
                }
            }
            // A retried broadcast of bytes the node already holds
            Err(TrustSealError::SubmissionRejected(msg)) if msg.contains("already known") => {
                debug!(tx_id = %transaction.tx_id, "Transaction already in mempool");
            }
            // The node's pending count is authoritative whether or not the bytes landed
            Err(e) => {
                self.nonces.mark_stale();
                return Err(e);
            }
        }

        Ok(SubmittedTransaction {
            tx_id: transaction.tx_id.clone(),
            submitted_at: Utc::now(),
        })
    }

    async fn await_confirmation(
        &self,
        submitted: &SubmittedTransaction,
        timeout: Duration,
    ) -> TrustSealResult<TransactionReceipt> {
        let hash = parse_tx_hash(&submitted.tx_id)?;
        let poll_interval = self.config.timing.poll_interval();

        let poll = async {
            loop {
                match self.lookup(hash).await {
                    Ok(ConfirmationStatus::Confirmed(receipt)) => return Ok(receipt),
                    Ok(ConfirmationStatus::Reverted) => {
                        return Err(TrustSealError::SubmissionRejected(format!(
                            "transaction {} reverted",
                            submitted.tx_id
                        )))
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(tx_id = %submitted.tx_id, error = %e, "Receipt poll failed");
                    }
                }
                tokio::time::sleep(poll_interval).await;
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| TrustSealError::ConfirmationTimeout {
                tx_id: submitted.tx_id.clone(),
            })?
    }

    async fn transaction_status(&self, tx_id: &str) -> TrustSealResult<ConfirmationStatus> {
        let hash = parse_tx_hash(tx_id)?;
        self.lookup(hash).await
    }

    async fn is_connected(&self) -> bool {
        match self.read("eth_chainId", self.provider.get_chainid()).await {
            Ok(chain_id) if chain_id.low_u64() == self.config.chain.chain_id => true,
            Ok(chain_id) => {
                warn!(
                    expected = self.config.chain.chain_id,
                    reported = chain_id.low_u64(),
                    "RPC endpoint serves a different chain"
                );
                false
            }
            Err(e) => {
                debug!(error = %e, "Ledger health check failed");
                false
            }
        }
    }

    fn verification_reference(&self, tx_id: &str) -> String {
        self.config.chain.tx_explorer_url(tx_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::blockchain::{
        BlockchainConfigBuilder, BlockchainEnvironment, ChainConfig, LedgerTiming, WalletManager,
    };
    use crate::evidence::MetadataBuilder;

    fn unreachable_ledger(max_payload_bytes: usize) -> EthereumLedger {
        let config = BlockchainConfigBuilder::new()
            .environment(BlockchainEnvironment::Testnet)
            .chain(ChainConfig::polygon_amoy())
            .rpc_url("http://127.0.0.1:1")
            .contract_address("0x5FbDB2315678afecb367f032d93F642f64180aa3")
            .timing(LedgerTiming {
                rpc_timeout_ms: 500,
                poll_interval_ms: 10,
                confirmations: 1,
            })
            .max_payload_bytes(max_payload_bytes)
            .build()
            .unwrap();
        EthereumLedger::new(config, WalletManager::random()).unwrap()
    }

    fn unsigned(ledger: &EthereumLedger, digest: &Digest) -> UnsignedTransaction {
        let metadata = MetadataBuilder::new().file_name("contract.pdf").build();
        UnsignedTransaction {
            digest: digest.clone(),
            to: format!("0x{:x}", ledger.contract_address),
            data: ledger.encode_call(digest, &metadata).unwrap().to_vec(),
            gas_limit: 60_000,
            gas_price_wei: 30_000_000_000,
            nonce: 0,
            chain_id: 80002,
        }
    }

    #[test]
    fn test_encode_call_starts_with_selector() {
        let ledger = unreachable_ledger(16 * 1024);
        let digest = Digest::of_bytes(b"document");
        let metadata = MetadataBuilder::new().file_name("a.pdf").build();

        let data = ledger.encode_call(&digest, &metadata).unwrap();
        let selector = &ethers::utils::id("notarize(bytes32,string)")[..4];
        assert_eq!(&data[..4], selector);
        // bytes32 argument follows the selector verbatim
        assert_eq!(&data[4..36], &digest.to_bytes32());
    }

    #[test]
    fn test_encode_call_rejects_large_payload() {
        let ledger = unreachable_ledger(64);
        let digest = Digest::of_bytes(b"document");
        let metadata = MetadataBuilder::new()
            .file_name("a-very-long-file-name-that-pushes-the-payload-over-the-limit.pdf")
            .build();

        let err = ledger.encode_call(&digest, &metadata).unwrap_err();
        assert!(matches!(err, TrustSealError::PayloadTooLarge { limit: 64, .. }));
    }

    #[test]
    fn test_sign_is_offline_and_produces_tx_id() {
        let ledger = unreachable_ledger(16 * 1024);
        let digest = Digest::of_bytes(b"document");

        let signed = ledger.sign(unsigned(&ledger, &digest)).unwrap();
        assert!(crate::evidence::blockchain::is_valid_tx_id(&signed.tx_id));
        assert!(!signed.raw.is_empty());
        assert_eq!(signed.nonce, 0);
    }

    #[test]
    fn test_sign_rejects_invalid_destination() {
        let ledger = unreachable_ledger(16 * 1024);
        let digest = Digest::of_bytes(b"document");
        let mut tx = unsigned(&ledger, &digest);
        tx.to = "not-an-address".to_string();

        let err = ledger.sign(tx).unwrap_err();
        assert!(matches!(err, TrustSealError::SigningFailed(_)));
    }

    #[tokio::test]
    async fn test_estimate_against_unreachable_node() {
        let ledger = unreachable_ledger(16 * 1024);
        let digest = Digest::of_bytes(b"document");
        let metadata = MetadataBuilder::new().build();

        let err = ledger.estimate_cost(&digest, &metadata).await.unwrap_err();
        assert!(err.is_transient(), "unexpected error: {:?}", err);
    }

    #[tokio::test]
    async fn test_health_check_against_unreachable_node() {
        let ledger = unreachable_ledger(16 * 1024);
        assert!(!ledger.is_connected().await);
    }

    #[tokio::test]
    async fn test_status_rejects_malformed_tx_id() {
        let ledger = unreachable_ledger(16 * 1024);
        let err = ledger.transaction_status("0x1234").await.unwrap_err();
        assert!(matches!(err, TrustSealError::InvalidTransactionId(_)));
    }

    #[test]
    fn test_verification_reference() {
        let ledger = unreachable_ledger(16 * 1024);
        assert_eq!(
            ledger.verification_reference("0xabc123"),
            "https://amoy.polygonscan.com/tx/0xabc123"
        );
    }
}
