//! In-memory repository implementation

use super::traits::{sort_records, PendingRecord, PendingTransactionRepository};
use crate::error::{TrustSealError, TrustSealResult};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Pending transactions held in process memory
#[derive(Debug, Default)]
pub struct InMemoryPendingRepository {
    records: Mutex<HashMap<String, PendingRecord>>,
}

impl InMemoryPendingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> TrustSealResult<MutexGuard<'_, HashMap<String, PendingRecord>>> {
        self.records
            .lock()
            .map_err(|_| TrustSealError::StorageError("pending store lock poisoned".to_string()))
    }
}

impl PendingTransactionRepository for InMemoryPendingRepository {
    fn save_pending(&self, record: &PendingRecord) -> TrustSealResult<()> {
        self.records()?.insert(record.tx_id.clone(), record.clone());
        Ok(())
    }

    fn load_pending(&self, tx_id: &str) -> TrustSealResult<Option<PendingRecord>> {
        Ok(self.records()?.get(tx_id).cloned())
    }

    fn load_all_pending(&self) -> TrustSealResult<Vec<PendingRecord>> {
        let mut records: Vec<_> = self.records()?.values().cloned().collect();
        sort_records(&mut records);
        Ok(records)
    }

    fn delete_pending(&self, tx_id: &str) -> TrustSealResult<()> {
        self.records()?.remove(tx_id);
        Ok(())
    }

    fn count_pending(&self) -> TrustSealResult<usize> {
        Ok(self.records()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::Digest;
    use crate::state_machine::AttemptPhase;

    #[test]
    fn test_save_load_delete() {
        let repo = InMemoryPendingRepository::new();
        let record = PendingRecord::new("0x01", Digest::of_bytes(b"a"), "a.pdf");

        repo.save_pending(&record).unwrap();
        assert!(repo.has_pending("0x01").unwrap());
        assert_eq!(repo.load_pending("0x01").unwrap(), Some(record));

        repo.delete_pending("0x01").unwrap();
        assert!(!repo.has_pending("0x01").unwrap());
        assert_eq!(repo.count_pending().unwrap(), 0);
    }

    #[test]
    fn test_save_replaces_state() {
        let repo = InMemoryPendingRepository::new();
        let record = PendingRecord::new("0x01", Digest::of_bytes(b"a"), "a.pdf");
        repo.save_pending(&record).unwrap();
        repo.save_pending(&record.clone().with_state(AttemptPhase::TimedOut))
            .unwrap();

        assert_eq!(repo.count_pending().unwrap(), 1);
        let stored = repo.load_pending("0x01").unwrap().unwrap();
        assert_eq!(stored.state, AttemptPhase::TimedOut);
    }

    #[test]
    fn test_delete_unknown_is_ok() {
        let repo = InMemoryPendingRepository::new();
        assert!(repo.delete_pending("0xmissing").is_ok());
    }
}
