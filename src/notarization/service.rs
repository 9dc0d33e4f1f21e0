use super::request::NotarizationRequest;
use super::response::{
    NotarizationOutcome, NotarizationReceipt, PendingNotarization, ReconcileReport,
};
use super::retry::RetryPolicy;
use crate::error::{TrustSealError, TrustSealResult};
use crate::evidence::blockchain::{
    is_valid_tx_id, ConfirmationStatus, CostEstimate, LedgerClient,
};
use crate::evidence::{Digest, Metadata};
use crate::repository::{InMemoryPendingRepository, PendingRecord, PendingTransactionRepository};
use crate::state_machine::{AttemptPhase, NotarizationAttempt, RejectedStage};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Tunables for the notarization pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    /// How long `process` waits for inclusion before answering `pending`
    pub confirmation_timeout: Duration,

    pub retry: RetryPolicy,

    /// Age after which a signed transaction the ledger has never seen is dropped
    pub abandon_after: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            confirmation_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            abandon_after: Duration::from_secs(10 * 60),
        }
    }
}

/// Orchestrates hashing, metadata, and the ledger pipeline
///
/// Cheap to clone; all clones share the ledger client and pending store.
#[derive(Clone)]
pub struct NotarizationService {
    ledger: Arc<dyn LedgerClient>,
    pending: Arc<dyn PendingTransactionRepository>,
    settings: ServiceSettings,
}

impl NotarizationService {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        pending: Arc<dyn PendingTransactionRepository>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            ledger,
            pending,
            settings,
        }
    }

    /// Service with default settings and an in-memory pending store
    pub fn with_ledger(ledger: Arc<dyn LedgerClient>) -> Self {
        Self::new(
            ledger,
            Arc::new(InMemoryPendingRepository::new()),
            ServiceSettings::default(),
        )
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn network_name(&self) -> &str {
        self.ledger.network_name()
    }

    /// Notarize one document
    ///
    /// The digest is validated before any ledger call. Once the cost is known the
    /// rest of the pipeline runs in a spawned task, so dropping the returned
    /// future never abandons a transaction mid-broadcast.
    ///
    /// # Errors
    /// Caller errors (`InvalidDigestFormat`, `PayloadTooLarge`) and ledger errors
    /// (`LedgerUnreachable`, `SubmissionRejected`, ...). A confirmation timeout is
    /// not an error: it yields `NotarizationOutcome::Pending`.
    pub async fn process(
        &self,
        request: NotarizationRequest,
    ) -> TrustSealResult<NotarizationOutcome> {
        let digest = request.resolve_digest()?;
        let metadata = request.metadata();

        info!(
            digest = %digest,
            file_name = %metadata.file_name,
            service_type = %metadata.service_type,
            "Notarization requested"
        );

        let ledger = &self.ledger;
        let cost = self
            .settings
            .retry
            .run("estimate_cost", || ledger.estimate_cost(&digest, &metadata))
            .await?;

        let pipeline = AnchorPipeline {
            ledger: self.ledger.clone(),
            pending: self.pending.clone(),
            settings: self.settings,
        };

        tokio::spawn(async move { pipeline.run(digest, metadata, cost).await })
            .await
            .map_err(|e| TrustSealError::Internal(format!("Notarization task failed: {}", e)))?
    }

    /// Current ledger status of a transaction id
    ///
    /// # Errors
    /// `InvalidTransactionId` unless the id is `0x` followed by 64 hex characters.
    pub async fn confirmation_status(&self, tx_id: &str) -> TrustSealResult<ConfirmationStatus> {
        if !is_valid_tx_id(tx_id) {
            return Err(TrustSealError::InvalidTransactionId(format!(
                "expected 0x followed by 64 hex characters, got {} characters",
                tx_id.len()
            )));
        }
        self.ledger.transaction_status(&tx_id.to_lowercase()).await
    }

    pub fn verification_reference(&self, tx_id: &str) -> String {
        self.ledger.verification_reference(tx_id)
    }

    pub async fn ledger_connected(&self) -> bool {
        self.ledger.is_connected().await
    }

    /// Transactions broadcast (or signed) but not yet resolved
    pub fn pending_transactions(&self) -> TrustSealResult<Vec<PendingRecord>> {
        self.pending.load_all_pending()
    }

    /// Re-check every tracked transaction against the ledger
    ///
    /// Confirmed and reverted transactions are dropped from the store. So is a
    /// transaction that was signed but whose broadcast never reached the ledger,
    /// once it is older than `abandon_after`: its nonce has been handed out again,
    /// so those bytes can no longer be mined. Everything else stays for the next pass.
    pub async fn reconcile_pending(&self) -> TrustSealResult<ReconcileReport> {
        let records = self.pending.load_all_pending()?;
        let mut report = ReconcileReport::default();

        for record in records {
            report.checked += 1;
            let attempt = NotarizationAttempt::resume(&record);

            match self.ledger.transaction_status(&record.tx_id).await {
                Ok(ConfirmationStatus::Confirmed(receipt)) => {
                    self.pending.delete_pending(&record.tx_id)?;
                    let confirmed = attempt.resolve(receipt);
                    info!(
                        tx_id = %record.tx_id,
                        digest = %confirmed.digest(),
                        block = ?confirmed.receipt().block_number,
                        "Pending transaction confirmed"
                    );
                    report.confirmed += 1;
                }
                Ok(ConfirmationStatus::Reverted) => {
                    self.pending.delete_pending(&record.tx_id)?;
                    let rejected = attempt.reject("transaction reverted");
                    warn!(
                        tx_id = %record.tx_id,
                        digest = %rejected.digest(),
                        stage = rejected.stage().as_str(),
                        "Pending transaction reverted"
                    );
                    report.reverted += 1;
                }
                Ok(ConfirmationStatus::Unknown) if self.is_abandoned(&record) => {
                    self.pending.delete_pending(&record.tx_id)?;
                    warn!(
                        tx_id = %record.tx_id,
                        digest = %record.digest,
                        file_name = %record.file_name,
                        signed_at = %record.submitted_at,
                        "Abandoning transaction that never reached the ledger"
                    );
                    report.abandoned += 1;
                }
                Ok(status) => {
                    debug!(tx_id = %record.tx_id, status = status.as_str(), "Still unresolved");
                    report.still_pending += 1;
                }
                Err(e) => {
                    warn!(tx_id = %record.tx_id, error = %e, "Status check failed");
                    report.failed += 1;
                }
            }
        }

        if report.checked > 0 {
            info!(
                checked = report.checked,
                confirmed = report.confirmed,
                reverted = report.reverted,
                still_pending = report.still_pending,
                abandoned = report.abandoned,
                failed = report.failed,
                "Reconciliation pass finished"
            );
        }

        Ok(report)
    }

    fn is_abandoned(&self, record: &PendingRecord) -> bool {
        record.state == AttemptPhase::Signed && record.age() >= self.settings.abandon_after
    }
}

/// Owned half of the pipeline that runs inside the spawned task
struct AnchorPipeline {
    ledger: Arc<dyn LedgerClient>,
    pending: Arc<dyn PendingTransactionRepository>,
    settings: ServiceSettings,
}

impl AnchorPipeline {
    async fn run(
        self,
        digest: Digest,
        metadata: Metadata,
        cost: CostEstimate,
    ) -> TrustSealResult<NotarizationOutcome> {
        let ledger = &self.ledger;
        let retry = self.settings.retry;

        let unsigned = retry
            .run("build_transaction", || {
                ledger.build_transaction(&digest, &metadata, &cost)
            })
            .await?;

        // Built → Signed
        let attempt = NotarizationAttempt::new(digest, metadata.file_name.clone(), cost, unsigned);
        let signed = match ledger.sign(attempt.state.transaction.clone()) {
            Ok(signed) => signed,
            Err(e) => {
                let rejected = attempt.reject(RejectedStage::Signing, e.to_string());
                error!(
                    attempt_id = %rejected.attempt_id(),
                    stage = rejected.stage().as_str(),
                    "Notarization rejected"
                );
                return Err(e);
            }
        };
        let attempt = attempt.sign(signed);

        let record = PendingRecord::new(attempt.tx_id(), attempt.digest().clone(), attempt.file_name());
        self.track(&record);

        // Signed → Submitted
        let transaction = attempt.state.transaction.clone();
        let handle = match retry.run("submit", || ledger.submit(&transaction)).await {
            Ok(handle) => handle,
            Err(e @ TrustSealError::SubmissionRejected(_)) => {
                self.untrack(attempt.tx_id());
                let rejected = attempt.reject(e.to_string());
                warn!(
                    attempt_id = %rejected.attempt_id(),
                    tx_id = ?rejected.state.tx_id,
                    stage = rejected.stage().as_str(),
                    reason = %rejected.reason(),
                    "Notarization rejected"
                );
                return Err(e);
            }
            Err(e) => {
                warn!(
                    tx_id = %attempt.tx_id(),
                    error = %e,
                    "Submission outcome unknown; kept for reconciliation"
                );
                return Err(e);
            }
        };
        let attempt = attempt.submit(handle);
        self.track(&record.clone().with_state(AttemptPhase::Submitted));
        info!(
            attempt_id = %attempt.attempt_id(),
            tx_id = %attempt.tx_id(),
            network = %ledger.network_name(),
            "Transaction submitted"
        );

        // Submitted → Confirmed | TimedOut | Rejected
        let timeout = self.settings.confirmation_timeout;
        match ledger.await_confirmation(&attempt.state.handle, timeout).await {
            Ok(receipt) => {
                self.untrack(attempt.tx_id());
                let confirmed = attempt.confirm(receipt);
                let reference = ledger.verification_reference(&confirmed.receipt().tx_id);
                info!(
                    attempt_id = %confirmed.attempt_id(),
                    tx_id = %confirmed.receipt().tx_id,
                    block = ?confirmed.receipt().block_number,
                    gas_used = confirmed.receipt().gas_used,
                    "Notarization confirmed"
                );
                Ok(NotarizationOutcome::Confirmed(NotarizationReceipt::new(
                    confirmed.digest(),
                    confirmed.file_name(),
                    confirmed.receipt(),
                    reference,
                )))
            }
            Err(TrustSealError::ConfirmationTimeout { .. }) => {
                let timed_out = attempt.time_out();
                self.track(&record.with_state(AttemptPhase::TimedOut));
                warn!(
                    attempt_id = %timed_out.attempt_id(),
                    tx_id = %timed_out.tx_id(),
                    timeout_secs = timeout.as_secs(),
                    "Confirmation timed out; returning pending"
                );
                Ok(NotarizationOutcome::Pending(PendingNotarization::new(
                    timed_out.digest(),
                    timed_out.file_name(),
                    timed_out.tx_id(),
                    metadata.timestamp,
                )))
            }
            Err(e @ TrustSealError::SubmissionRejected(_)) => {
                self.untrack(attempt.tx_id());
                let rejected = attempt.reject(e.to_string());
                warn!(
                    attempt_id = %rejected.attempt_id(),
                    tx_id = ?rejected.state.tx_id,
                    stage = rejected.stage().as_str(),
                    "Notarization reverted"
                );
                Err(e)
            }
            Err(e) => {
                warn!(tx_id = %attempt.tx_id(), error = %e, "Confirmation wait failed");
                Err(e)
            }
        }
    }

    fn track(&self, record: &PendingRecord) {
        if let Err(e) = self.pending.save_pending(record) {
            warn!(tx_id = %record.tx_id, error = %e, "Failed to record pending transaction");
        }
    }

    fn untrack(&self, tx_id: &str) {
        if let Err(e) = self.pending.delete_pending(tx_id) {
            warn!(tx_id = %tx_id, error = %e, "Failed to clear pending transaction");
        }
    }
}
