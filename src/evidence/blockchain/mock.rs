use super::config::{ChainConfig, DEFAULT_MAX_PAYLOAD_BYTES};
use super::types::{
    ConfirmationStatus, CostEstimate, SignedTransaction, SubmittedTransaction, TransactionReceipt,
    UnsignedTransaction,
};
use super::LedgerClient;
use crate::error::{TrustSealError, TrustSealResult};
use crate::evidence::{Digest, Metadata};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::time::{sleep, Duration};

/// Gas the mock reports for every confirmed notarization
pub const MOCK_GAS_USED: u64 = 50_000;

const MOCK_GAS_PRICE_WEI: u128 = 30_000_000_000;

/// How the mock resolves `await_confirmation`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationBehavior {
    /// Mine the transaction immediately
    Confirm,

    /// Stay pending until the caller's timeout elapses
    Timeout,

    /// Include the transaction but report a failed execution
    Revert,
}

/// Snapshot of how often each ledger operation was invoked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockCalls {
    pub estimate: usize,
    pub build: usize,
    pub sign: usize,
    pub submit: usize,
    pub confirm: usize,
}

impl MockCalls {
    pub fn total(&self) -> usize {
        self.estimate + self.build + self.sign + self.submit + self.confirm
    }
}

#[derive(Debug, Default)]
struct CallCounters {
    estimate: AtomicUsize,
    build: AtomicUsize,
    sign: AtomicUsize,
    submit: AtomicUsize,
    confirm: AtomicUsize,
}

/// Mock ledger for development and testing
///
/// Simulates the whole notarization pipeline without network calls or fees.
/// Failure modes can be injected to exercise retry, rejection and timeout paths.
pub struct MockLedger {
    /// Simulated network delay in milliseconds
    delay_ms: u64,
    chain: ChainConfig,
    network_name: String,
    max_payload_bytes: usize,
    confirmation: ConfirmationBehavior,
    reject_submissions: bool,
    failing_estimates: AtomicU32,
    failing_submissions: AtomicU32,
    connected: AtomicBool,
    nonce: AtomicU64,
    next_block: AtomicU64,
    transactions: Mutex<HashMap<String, ConfirmationStatus>>,
    calls: CallCounters,
}

impl MockLedger {
    /// Create a mock ledger with a small simulated delay
    pub fn new() -> Self {
        Self::with_chain(ChainConfig::polygon_amoy(), 100)
    }

    /// Create a mock ledger with instant responses (no delay)
    pub fn instant() -> Self {
        Self::with_chain(ChainConfig::polygon_amoy(), 0)
    }

    /// Create a mock that builds verification references from `chain`
    pub fn with_chain(chain: ChainConfig, delay_ms: u64) -> Self {
        Self {
            delay_ms,
            network_name: format!("{} (mock)", chain.name),
            chain,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            confirmation: ConfirmationBehavior::Confirm,
            reject_submissions: false,
            failing_estimates: AtomicU32::new(0),
            failing_submissions: AtomicU32::new(0),
            connected: AtomicBool::new(true),
            nonce: AtomicU64::new(0),
            next_block: AtomicU64::new(1_000_000),
            transactions: Mutex::new(HashMap::new()),
            calls: CallCounters::default(),
        }
    }

    pub fn with_max_payload_bytes(mut self, limit: usize) -> Self {
        self.max_payload_bytes = limit;
        self
    }

    pub fn with_confirmation(mut self, behavior: ConfirmationBehavior) -> Self {
        self.confirmation = behavior;
        self
    }

    /// Fail the next `count` cost estimates with a network fault
    pub fn fail_estimates(self, count: u32) -> Self {
        self.failing_estimates.store(count, Ordering::SeqCst);
        self
    }

    /// Fail the next `count` broadcasts with a network fault before they reach the mempool
    pub fn fail_submissions(self, count: u32) -> Self {
        self.failing_submissions.store(count, Ordering::SeqCst);
        self
    }

    /// Refuse every broadcast
    pub fn reject_submissions(mut self) -> Self {
        self.reject_submissions = true;
        self
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Mine a transaction that was left pending
    pub fn mine(&self, tx_id: &str) -> Option<TransactionReceipt> {
        let mut transactions = self.transactions.lock().ok()?;
        let status = transactions.get_mut(tx_id)?;
        if *status != ConfirmationStatus::Pending {
            return None;
        }
        let receipt = self.receipt_for(tx_id);
        *status = ConfirmationStatus::Confirmed(receipt.clone());
        Some(receipt)
    }

    pub fn calls(&self) -> MockCalls {
        MockCalls {
            estimate: self.calls.estimate.load(Ordering::SeqCst),
            build: self.calls.build.load(Ordering::SeqCst),
            sign: self.calls.sign.load(Ordering::SeqCst),
            submit: self.calls.submit.load(Ordering::SeqCst),
            confirm: self.calls.confirm.load(Ordering::SeqCst),
        }
    }

    async fn simulate_latency(&self) {
        if self.delay_ms > 0 {
            sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }

    fn check_payload(&self, metadata: &Metadata) -> TrustSealResult<Vec<u8>> {
        let payload = metadata.to_payload();
        if payload.len() > self.max_payload_bytes {
            return Err(TrustSealError::PayloadTooLarge {
                size: payload.len(),
                limit: self.max_payload_bytes,
            });
        }
        Ok(payload.into_bytes())
    }

    fn record(&self, tx_id: &str, status: ConfirmationStatus) {
        if let Ok(mut transactions) = self.transactions.lock() {
            transactions.insert(tx_id.to_string(), status);
        }
    }

    fn receipt_for(&self, tx_id: &str) -> TransactionReceipt {
        TransactionReceipt {
            tx_id: tx_id.to_string(),
            block_number: Some(self.next_block.fetch_add(1, Ordering::SeqCst)),
            gas_used: MOCK_GAS_USED,
            timestamp: Utc::now(),
        }
    }
}

/// Consume one scripted failure, if any remain
fn take_failure(remaining: &AtomicU32) -> bool {
    remaining
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    fn network_name(&self) -> &str {
        &self.network_name
    }

    async fn estimate_cost(
        &self,
        _digest: &Digest,
        metadata: &Metadata,
    ) -> TrustSealResult<CostEstimate> {
        self.calls.estimate.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if take_failure(&self.failing_estimates) {
            return Err(TrustSealError::NetworkUnavailable(
                "mock: simulated connection refused".to_string(),
            ));
        }

        self.check_payload(metadata)?;
        Ok(CostEstimate::with_headroom(MOCK_GAS_USED, MOCK_GAS_PRICE_WEI))
    }

    async fn build_transaction(
        &self,
        digest: &Digest,
        metadata: &Metadata,
        cost: &CostEstimate,
    ) -> TrustSealResult<UnsignedTransaction> {
        self.calls.build.fetch_add(1, Ordering::SeqCst);

        let payload = self.check_payload(metadata)?;
        let mut data = digest.to_bytes32().to_vec();
        data.extend_from_slice(&payload);

        Ok(UnsignedTransaction {
            digest: digest.clone(),
            to: self.chain.contract_address.clone(),
            data,
            gas_limit: cost.gas_limit,
            gas_price_wei: cost.gas_price_wei,
            nonce: self.nonce.fetch_add(1, Ordering::SeqCst),
            chain_id: self.chain.chain_id,
        })
    }

    fn sign(&self, transaction: UnsignedTransaction) -> TrustSealResult<SignedTransaction> {
        self.calls.sign.fetch_add(1, Ordering::SeqCst);

        let id: [u8; 32] = rand::random();
        Ok(SignedTransaction {
            tx_id: format!("0x{}", hex::encode(id)),
            raw: transaction.data,
            nonce: transaction.nonce,
        })
    }

    async fn submit(
        &self,
        transaction: &SignedTransaction,
    ) -> TrustSealResult<SubmittedTransaction> {
        self.calls.submit.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if take_failure(&self.failing_submissions) {
            return Err(TrustSealError::NetworkUnavailable(
                "mock: simulated broadcast timeout".to_string(),
            ));
        }

        if self.reject_submissions {
            return Err(TrustSealError::SubmissionRejected(
                "mock: insufficient funds for gas".to_string(),
            ));
        }

        self.record(&transaction.tx_id, ConfirmationStatus::Pending);
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
        self.calls.confirm.fetch_add(1, Ordering::SeqCst);

        match self.confirmation {
            ConfirmationBehavior::Confirm => {
                self.simulate_latency().await;
                let receipt = self.receipt_for(&submitted.tx_id);
                self.record(
                    &submitted.tx_id,
                    ConfirmationStatus::Confirmed(receipt.clone()),
                );
                Ok(receipt)
            }
            ConfirmationBehavior::Timeout => {
                sleep(timeout).await;
                Err(TrustSealError::ConfirmationTimeout {
                    tx_id: submitted.tx_id.clone(),
                })
            }
            ConfirmationBehavior::Revert => {
                self.simulate_latency().await;
                self.record(&submitted.tx_id, ConfirmationStatus::Reverted);
                Err(TrustSealError::SubmissionRejected(format!(
                    "transaction {} reverted",
                    submitted.tx_id
                )))
            }
        }
    }

    async fn transaction_status(&self, tx_id: &str) -> TrustSealResult<ConfirmationStatus> {
        self.simulate_latency().await;
        let transactions = self
            .transactions
            .lock()
            .map_err(|_| TrustSealError::Internal("mock ledger state poisoned".to_string()))?;
        Ok(transactions
            .get(tx_id)
            .cloned()
            .unwrap_or(ConfirmationStatus::Unknown))
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn verification_reference(&self, tx_id: &str) -> String {
        self.chain.tx_explorer_url(tx_id)
    }
}
