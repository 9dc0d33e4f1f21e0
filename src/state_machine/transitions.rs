/// State transition implementations
///
/// Each transition is a method that consumes the current state and returns a new state.
/// This ensures that invalid transitions are impossible at compile time.
use super::states::*;
use super::{AttemptContext, NotarizationAttempt};
use crate::evidence::blockchain::{
    CostEstimate, SignedTransaction, SubmittedTransaction, TransactionReceipt, UnsignedTransaction,
};
use crate::evidence::Digest;
use crate::repository::PendingRecord;
use chrono::Utc;
use uuid::Uuid;

// ============================================================================
// Built State Transitions
// ============================================================================

impl NotarizationAttempt<Built> {
    /// Start an attempt from a constructed transaction
    pub fn new(
        digest: Digest,
        file_name: impl Into<String>,
        cost: CostEstimate,
        transaction: UnsignedTransaction,
    ) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            state: Built { cost, transaction },
            context: AttemptContext {
                digest,
                file_name: file_name.into(),
                created_at: Utc::now(),
            },
        }
    }

    /// Transition to Signed state
    pub fn sign(self, transaction: SignedTransaction) -> NotarizationAttempt<Signed> {
        self.transition(Signed {
            transaction,
            signed_at: Utc::now(),
        })
    }

    /// Transition to Rejected state
    pub fn reject(
        self,
        stage: RejectedStage,
        reason: impl Into<String>,
    ) -> NotarizationAttempt<Rejected> {
        self.transition(Rejected {
            stage,
            reason: reason.into(),
            tx_id: None,
            rejected_at: Utc::now(),
        })
    }
}

// ============================================================================
// Signed State Transitions
// ============================================================================

impl NotarizationAttempt<Signed> {
    pub fn tx_id(&self) -> &str {
        &self.state.transaction.tx_id
    }

    /// Transition to Submitted state
    pub fn submit(self, handle: SubmittedTransaction) -> NotarizationAttempt<Submitted> {
        let transaction = self.state.transaction.clone();
        self.transition(Submitted {
            transaction,
            handle,
        })
    }

    /// Transition to Rejected state
    pub fn reject(self, reason: impl Into<String>) -> NotarizationAttempt<Rejected> {
        let tx_id = Some(self.state.transaction.tx_id.clone());
        self.transition(Rejected {
            stage: RejectedStage::Submission,
            reason: reason.into(),
            tx_id,
            rejected_at: Utc::now(),
        })
    }
}

// ============================================================================
// Submitted State Transitions
// ============================================================================

impl NotarizationAttempt<Submitted> {
    pub fn tx_id(&self) -> &str {
        &self.state.handle.tx_id
    }

    /// Transition to Confirmed state
    pub fn confirm(self, receipt: TransactionReceipt) -> NotarizationAttempt<Confirmed> {
        self.transition(Confirmed {
            receipt,
            confirmed_at: Utc::now(),
        })
    }

    /// Transition to TimedOut state
    pub fn time_out(self) -> NotarizationAttempt<TimedOut> {
        let handle = self.state.handle.clone();
        self.transition(TimedOut {
            handle,
            timed_out_at: Utc::now(),
        })
    }

    /// Transition to Rejected state (execution reverted)
    pub fn reject(self, reason: impl Into<String>) -> NotarizationAttempt<Rejected> {
        let tx_id = Some(self.state.handle.tx_id.clone());
        self.transition(Rejected {
            stage: RejectedStage::Execution,
            reason: reason.into(),
            tx_id,
            rejected_at: Utc::now(),
        })
    }
}

// ============================================================================
// TimedOut State Transitions
// ============================================================================

impl NotarizationAttempt<TimedOut> {
    /// Rehydrate an unresolved attempt from its pending record
    pub fn resume(record: &PendingRecord) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            state: TimedOut {
                handle: SubmittedTransaction {
                    tx_id: record.tx_id.clone(),
                    submitted_at: record.submitted_at,
                },
                timed_out_at: Utc::now(),
            },
            context: AttemptContext {
                digest: record.digest.clone(),
                file_name: record.file_name.clone(),
                created_at: record.submitted_at,
            },
        }
    }

    pub fn tx_id(&self) -> &str {
        &self.state.handle.tx_id
    }

    /// Late confirmation found during reconciliation
    pub fn resolve(self, receipt: TransactionReceipt) -> NotarizationAttempt<Confirmed> {
        self.transition(Confirmed {
            receipt,
            confirmed_at: Utc::now(),
        })
    }

    /// Late revert found during reconciliation
    pub fn reject(self, reason: impl Into<String>) -> NotarizationAttempt<Rejected> {
        let tx_id = Some(self.state.handle.tx_id.clone());
        self.transition(Rejected {
            stage: RejectedStage::Execution,
            reason: reason.into(),
            tx_id,
            rejected_at: Utc::now(),
        })
    }
}

// ============================================================================
// Terminal States
// ============================================================================

impl NotarizationAttempt<Confirmed> {
    pub fn receipt(&self) -> &TransactionReceipt {
        &self.state.receipt
    }

    pub fn into_receipt(self) -> TransactionReceipt {
        self.state.receipt
    }
}

impl NotarizationAttempt<Rejected> {
    pub fn stage(&self) -> RejectedStage {
        self.state.stage
    }

    pub fn reason(&self) -> &str {
        &self.state.reason
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::built_attempt;
    use super::*;

    fn signed_tx(tx_id: &str) -> SignedTransaction {
        SignedTransaction {
            tx_id: tx_id.to_string(),
            raw: vec![0xf8],
            nonce: 4,
        }
    }

    fn handle(tx_id: &str) -> SubmittedTransaction {
        SubmittedTransaction {
            tx_id: tx_id.to_string(),
            submitted_at: Utc::now(),
        }
    }

    fn receipt(tx_id: &str) -> TransactionReceipt {
        TransactionReceipt {
            tx_id: tx_id.to_string(),
            block_number: Some(42),
            gas_used: 50_000,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_happy_path() {
        let attempt = built_attempt();
        assert_eq!(attempt.state.transaction.nonce, 4);

        let attempt = attempt.sign(signed_tx("0x01"));
        assert_eq!(attempt.tx_id(), "0x01");

        let attempt = attempt.submit(handle("0x01"));
        assert_eq!(attempt.tx_id(), "0x01");

        let attempt = attempt.confirm(receipt("0x01"));
        assert_eq!(attempt.receipt().block_number, Some(42));
    }

    #[test]
    fn test_timeout_then_resolve() {
        let attempt = built_attempt()
            .sign(signed_tx("0x02"))
            .submit(handle("0x02"))
            .time_out();
        assert_eq!(attempt.tx_id(), "0x02");

        let confirmed = attempt.resolve(receipt("0x02"));
        assert_eq!(confirmed.into_receipt().tx_id, "0x02");
    }

    #[test]
    fn test_rejection_keeps_tx_id_when_known() {
        let rejected = built_attempt().sign(signed_tx("0x03")).reject("nonce too low");
        assert_eq!(rejected.stage(), RejectedStage::Submission);
        assert_eq!(rejected.state.tx_id.as_deref(), Some("0x03"));
        assert_eq!(rejected.reason(), "nonce too low");

        let reverted = built_attempt()
            .sign(signed_tx("0x04"))
            .submit(handle("0x04"))
            .reject("reverted");
        assert_eq!(reverted.stage(), RejectedStage::Execution);
    }

    #[test]
    fn test_resume_from_pending_record() {
        let record = PendingRecord::new("0x05", Digest::of_bytes(b"late"), "late.pdf");
        let attempt = NotarizationAttempt::resume(&record);

        assert_eq!(attempt.tx_id(), "0x05");
        assert_eq!(attempt.file_name(), "late.pdf");
        assert_eq!(attempt.state.handle.submitted_at, record.submitted_at);

        let rejected = attempt.reject("reverted");
        assert_eq!(rejected.state.tx_id.as_deref(), Some("0x05"));
    }

    #[test]
    fn test_signing_rejection_has_no_tx_id() {
        let rejected = built_attempt().reject(RejectedStage::Signing, "wallet could not sign");
        assert!(rejected.state.tx_id.is_none());
        assert_eq!(rejected.stage().as_str(), "signing");
    }
}
