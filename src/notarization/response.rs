use crate::error::TrustSealError;
use crate::evidence::blockchain::{ConfirmationStatus, TransactionReceipt};
use crate::evidence::Digest;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

fn rfc3339(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Proof of anchoring returned once the transaction is confirmed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotarizationReceipt {
    pub success: bool,
    pub file_hash: String,
    pub file_name: String,
    pub tx_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub timestamp: String,
    pub verification_reference: String,
}

impl NotarizationReceipt {
    pub fn new(
        digest: &Digest,
        file_name: impl Into<String>,
        receipt: &TransactionReceipt,
        verification_reference: String,
    ) -> Self {
        Self {
            success: true,
            file_hash: digest.to_string(),
            file_name: file_name.into(),
            tx_id: receipt.tx_id.clone(),
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            timestamp: rfc3339(&receipt.timestamp),
            verification_reference,
        }
    }
}

/// Submitted but not confirmed within the wait budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingNotarization {
    pub success: bool,
    pub file_hash: String,
    pub file_name: String,
    pub tx_id: String,
    pub pending: bool,
    pub timestamp: String,
}

impl PendingNotarization {
    pub fn new(
        digest: &Digest,
        file_name: impl Into<String>,
        tx_id: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            file_hash: digest.to_string(),
            file_name: file_name.into(),
            tx_id: tx_id.into(),
            pending: true,
            timestamp: timestamp.into(),
        }
    }
}

/// Result of a notarization that reached the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NotarizationOutcome {
    Confirmed(NotarizationReceipt),
    Pending(PendingNotarization),
}

impl NotarizationOutcome {
    pub fn tx_id(&self) -> &str {
        match self {
            NotarizationOutcome::Confirmed(receipt) => &receipt.tx_id,
            NotarizationOutcome::Pending(pending) => &pending.tx_id,
        }
    }

    pub fn file_hash(&self) -> &str {
        match self {
            NotarizationOutcome::Confirmed(receipt) => &receipt.file_hash,
            NotarizationOutcome::Pending(pending) => &pending.file_hash,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, NotarizationOutcome::Pending(_))
    }
}

/// Failure body: `{ success: false, errorKind, details }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error_kind: String,
    pub details: String,
}

impl From<&TrustSealError> for ErrorResponse {
    fn from(err: &TrustSealError) -> Self {
        Self {
            success: false,
            error_kind: err.error_kind().to_string(),
            details: err.to_string(),
        }
    }
}

/// Ledger-side view of one transaction id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatusResponse {
    pub tx_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub verification_reference: String,
}

impl TransactionStatusResponse {
    pub fn new(
        tx_id: impl Into<String>,
        status: &ConfirmationStatus,
        verification_reference: String,
    ) -> Self {
        let receipt = match status {
            ConfirmationStatus::Confirmed(receipt) => Some(receipt),
            _ => None,
        };

        Self {
            tx_id: tx_id.into(),
            status: status.as_str().to_string(),
            block_number: receipt.and_then(|r| r.block_number),
            gas_used: receipt.map(|r| r.gas_used),
            timestamp: receipt.map(|r| rfc3339(&r.timestamp)),
            verification_reference,
        }
    }
}

/// Summary of one reconciliation pass over pending transactions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub checked: usize,
    pub confirmed: usize,
    pub reverted: usize,
    pub still_pending: usize,
    pub abandoned: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn receipt() -> TransactionReceipt {
        TransactionReceipt {
            tx_id: format!("0x{}", "b".repeat(64)),
            block_number: Some(17),
            gas_used: 50_000,
            timestamp: DateTime::parse_from_rfc3339("2025-01-02T03:04:05Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn test_confirmed_shape() {
        let digest = Digest::parse(&"a".repeat(64)).unwrap();
        let outcome = NotarizationOutcome::Confirmed(NotarizationReceipt::new(
            &digest,
            "contract.pdf",
            &receipt(),
            "https://explorer/tx/0xbb".to_string(),
        ));

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            value,
            json!({
                "success": true,
                "fileHash": "a".repeat(64),
                "fileName": "contract.pdf",
                "txId": format!("0x{}", "b".repeat(64)),
                "blockNumber": 17,
                "gasUsed": 50_000,
                "timestamp": "2025-01-02T03:04:05.000Z",
                "verificationReference": "https://explorer/tx/0xbb",
            })
        );
    }

    #[test]
    fn test_pending_shape() {
        let digest = Digest::parse(&"a".repeat(64)).unwrap();
        let outcome = NotarizationOutcome::Pending(PendingNotarization::new(
            &digest,
            "contract.pdf",
            "0x01",
            "2025-01-02T03:04:05.000Z",
        ));

        assert!(outcome.is_pending());
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["pending"], true);
        assert_eq!(value["success"], true);
        assert_eq!(value["txId"], "0x01");
        assert!(value.get("verificationReference").is_none());
    }

    #[test]
    fn test_error_shape() {
        let err = TrustSealError::InvalidDigestFormat("ABC123".to_string());
        let value = serde_json::to_value(ErrorResponse::from(&err)).unwrap();

        assert_eq!(value["success"], false);
        assert_eq!(value["errorKind"], "InvalidDigestFormat");
        assert!(value["details"].as_str().unwrap().contains("ABC123"));
    }

    #[test]
    fn test_status_shape() {
        let confirmed = ConfirmationStatus::Confirmed(receipt());
        let response = TransactionStatusResponse::new("0x01", &confirmed, "ref".to_string());
        assert_eq!(response.status, "confirmed");
        assert_eq!(response.block_number, Some(17));

        let pending = TransactionStatusResponse::new("0x01", &ConfirmationStatus::Pending, "ref".to_string());
        let value = serde_json::to_value(&pending).unwrap();
        assert_eq!(value["status"], "pending");
        assert!(value.get("gasUsed").is_none());
    }
}
