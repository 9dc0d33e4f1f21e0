//! Repository trait definitions
//!
//! These traits define the abstract interfaces for data access operations.
//! Different implementations can provide different storage backends.

use crate::error::TrustSealResult;
use crate::evidence::Digest;
use crate::state_machine::AttemptPhase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A signed transaction whose outcome is not yet known
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRecord {
    pub tx_id: String,
    pub digest: Digest,
    pub file_name: String,
    pub submitted_at: DateTime<Utc>,
    pub state: AttemptPhase,
}

impl PendingRecord {
    pub fn new(tx_id: impl Into<String>, digest: Digest, file_name: impl Into<String>) -> Self {
        Self {
            tx_id: tx_id.into(),
            digest,
            file_name: file_name.into(),
            submitted_at: Utc::now(),
            state: AttemptPhase::Signed,
        }
    }

    pub fn with_state(mut self, state: AttemptPhase) -> Self {
        self.state = state;
        self
    }

    /// Time since the record was first written; zero if the clock went backwards
    pub fn age(&self) -> Duration {
        (Utc::now() - self.submitted_at).to_std().unwrap_or_default()
    }
}

/// Repository for unconfirmed ledger transactions
///
/// Keyed by transaction id. Saving an existing id replaces the record.
pub trait PendingTransactionRepository: Send + Sync {
    /// Insert or replace a record
    fn save_pending(&self, record: &PendingRecord) -> TrustSealResult<()>;

    /// Load a record by transaction id
    fn load_pending(&self, tx_id: &str) -> TrustSealResult<Option<PendingRecord>>;

    /// Load all records, oldest submission first
    fn load_all_pending(&self) -> TrustSealResult<Vec<PendingRecord>>;

    /// Delete a record; deleting an unknown id is not an error
    fn delete_pending(&self, tx_id: &str) -> TrustSealResult<()>;

    /// Check if a record exists
    fn has_pending(&self, tx_id: &str) -> TrustSealResult<bool> {
        Ok(self.load_pending(tx_id)?.is_some())
    }

    /// Count tracked records
    fn count_pending(&self) -> TrustSealResult<usize> {
        Ok(self.load_all_pending()?.len())
    }
}

/// Order records by submission time, then id
pub(crate) fn sort_records(records: &mut [PendingRecord]) {
    records.sort_by(|a, b| {
        a.submitted_at
            .cmp(&b.submitted_at)
            .then_with(|| a.tx_id.cmp(&b.tx_id))
    });
}
