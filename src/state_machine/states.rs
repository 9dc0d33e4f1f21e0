/// State type definitions for the notarization state machine
///
/// Each state is a distinct type, making invalid states impossible to represent.
/// State-specific data is stored in each state type.
use crate::evidence::blockchain::{
    CostEstimate, SignedTransaction, SubmittedTransaction, TransactionReceipt, UnsignedTransaction,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Built state - transaction constructed but not signed
#[derive(Debug, Clone)]
pub struct Built {
    pub cost: CostEstimate,
    pub transaction: UnsignedTransaction,
}

/// Signed state - transaction id is fixed from here on
#[derive(Debug, Clone)]
pub struct Signed {
    pub transaction: SignedTransaction,
    pub signed_at: DateTime<Utc>,
}

/// Submitted state - broadcast, awaiting inclusion
#[derive(Debug, Clone)]
pub struct Submitted {
    pub transaction: SignedTransaction,
    pub handle: SubmittedTransaction,
}

/// Confirmed state - included in a block
#[derive(Debug, Clone)]
pub struct Confirmed {
    pub receipt: TransactionReceipt,
    pub confirmed_at: DateTime<Utc>,
}

/// TimedOut state - broadcast but no receipt within the wait budget
///
/// The transaction may still be mined; reconciliation resolves it later.
#[derive(Debug, Clone)]
pub struct TimedOut {
    pub handle: SubmittedTransaction,
    pub timed_out_at: DateTime<Utc>,
}

/// Rejected state - the attempt failed permanently
#[derive(Debug, Clone)]
pub struct Rejected {
    pub stage: RejectedStage,
    pub reason: String,

    /// Transaction id, if signing got that far
    pub tx_id: Option<String>,
    pub rejected_at: DateTime<Utc>,
}

/// Stage at which an attempt was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectedStage {
    Signing,
    Submission,
    Execution,
}

impl RejectedStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectedStage::Signing => "signing",
            RejectedStage::Submission => "submission",
            RejectedStage::Execution => "execution",
        }
    }
}

/// Persistable phase of an attempt whose transaction id is known but unresolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptPhase {
    Signed,
    Submitted,
    TimedOut,
}

impl AttemptPhase {
    pub fn state_name(&self) -> &'static str {
        match self {
            AttemptPhase::Signed => "Signed",
            AttemptPhase::Submitted => "Submitted",
            AttemptPhase::TimedOut => "TimedOut",
        }
    }
}
