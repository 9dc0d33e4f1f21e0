//! File-based repository implementation
//!
//! Records are kept as a single JSON object keyed by transaction id. Every
//! mutation rewrites the file through a temporary sibling and a rename.

use super::traits::{sort_records, PendingRecord, PendingTransactionRepository};
use crate::error::{TrustSealError, TrustSealResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

type RecordMap = BTreeMap<String, PendingRecord>;

/// Pending transactions persisted to a JSON file
#[derive(Debug)]
pub struct FilePendingRepository {
    store_path: PathBuf,
    lock: Mutex<()>,
}

impl FilePendingRepository {
    /// Create a repository backed by `store_path`, creating parent directories
    pub fn new(store_path: impl Into<PathBuf>) -> TrustSealResult<Self> {
        let store_path = store_path.into();
        if let Some(parent) = store_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    TrustSealError::StorageError(format!(
                        "Failed to create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(Self {
            store_path,
            lock: Mutex::new(()),
        })
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    fn guard(&self) -> TrustSealResult<MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| TrustSealError::StorageError("pending store lock poisoned".to_string()))
    }

    fn read_map(&self) -> TrustSealResult<RecordMap> {
        if !self.store_path.exists() {
            return Ok(RecordMap::new());
        }

        let contents = fs::read_to_string(&self.store_path)?;
        if contents.trim().is_empty() {
            return Ok(RecordMap::new());
        }

        serde_json::from_str(&contents).map_err(|e| {
            TrustSealError::StorageError(format!(
                "Corrupt pending store {}: {}",
                self.store_path.display(),
                e
            ))
        })
    }

    fn write_map(&self, records: &RecordMap) -> TrustSealResult<()> {
        let json = serde_json::to_string_pretty(records)?;
        let tmp_path = self.store_path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.store_path)?;
        debug!(path = %self.store_path.display(), records = records.len(), "Pending store saved");
        Ok(())
    }
}

impl PendingTransactionRepository for FilePendingRepository {
    fn save_pending(&self, record: &PendingRecord) -> TrustSealResult<()> {
        let _guard = self.guard()?;
        let mut records = self.read_map()?;
        records.insert(record.tx_id.clone(), record.clone());
        self.write_map(&records)
    }

    fn load_pending(&self, tx_id: &str) -> TrustSealResult<Option<PendingRecord>> {
        let _guard = self.guard()?;
        Ok(self.read_map()?.remove(tx_id))
    }

    fn load_all_pending(&self) -> TrustSealResult<Vec<PendingRecord>> {
        let _guard = self.guard()?;
        let mut records: Vec<_> = self.read_map()?.into_values().collect();
        sort_records(&mut records);
        Ok(records)
    }

    fn delete_pending(&self, tx_id: &str) -> TrustSealResult<()> {
        let _guard = self.guard()?;
        let mut records = self.read_map()?;
        if records.remove(tx_id).is_some() {
            self.write_map(&records)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::Digest;
    use crate::state_machine::AttemptPhase;
    use tempfile::TempDir;

    fn record(tx_id: &str) -> PendingRecord {
        PendingRecord::new(tx_id, Digest::of_bytes(tx_id.as_bytes()), "doc.pdf")
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("pending.json");

        let repo = FilePendingRepository::new(&path).unwrap();
        repo.save_pending(&record("0x01")).unwrap();
        repo.save_pending(&record("0x02").with_state(AttemptPhase::TimedOut))
            .unwrap();
        drop(repo);

        let reopened = FilePendingRepository::new(&path).unwrap();
        assert_eq!(reopened.count_pending().unwrap(), 2);
        let stored = reopened.load_pending("0x02").unwrap().unwrap();
        assert_eq!(stored.state, AttemptPhase::TimedOut);
        assert_eq!(stored.digest, Digest::of_bytes(b"0x02"));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let repo = FilePendingRepository::new(dir.path().join("pending.json")).unwrap();

        assert!(repo.load_all_pending().unwrap().is_empty());
        assert!(repo.load_pending("0x01").unwrap().is_none());
    }

    #[test]
    fn test_delete_rewrites_file() {
        let dir = TempDir::new().unwrap();
        let repo = FilePendingRepository::new(dir.path().join("pending.json")).unwrap();
        repo.save_pending(&record("0x01")).unwrap();
        repo.save_pending(&record("0x02")).unwrap();

        repo.delete_pending("0x01").unwrap();

        let remaining = repo.load_all_pending().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].tx_id, "0x02");
    }

    #[test]
    fn test_corrupt_file_reports_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pending.json");
        fs::write(&path, "{ not json").unwrap();

        let repo = FilePendingRepository::new(&path).unwrap();
        let err = repo.load_all_pending().unwrap_err();
        assert!(matches!(err, TrustSealError::StorageError(_)));
    }

    #[test]
    fn test_file_uses_camel_case() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pending.json");
        let repo = FilePendingRepository::new(&path).unwrap();
        repo.save_pending(&record("0x01")).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"txId\""));
        assert!(raw.contains("\"submittedAt\""));
        assert!(raw.contains("\"signed\""));
    }
}
