use crate::evidence::Digest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fee quote for a notarization transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostEstimate {
    /// Gas limit including headroom over the node's estimate
    pub gas_limit: u64,

    /// Gas price in wei
    pub gas_price_wei: u128,
}

impl CostEstimate {
    /// Headroom applied to raw node estimates, in percent
    pub const HEADROOM_PERCENT: u64 = 20;

    pub fn with_headroom(estimated_gas: u64, gas_price_wei: u128) -> Self {
        let headroom = estimated_gas.saturating_mul(Self::HEADROOM_PERCENT) / 100;
        Self {
            gas_limit: estimated_gas.saturating_add(headroom),
            gas_price_wei,
        }
    }

    /// Maximum fee in wei the transaction can consume
    pub fn max_fee_wei(&self) -> u128 {
        (self.gas_limit as u128).saturating_mul(self.gas_price_wei)
    }
}

/// Transaction calling the notary contract, ready to be signed
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    pub digest: Digest,
    /// Contract address (0x-prefixed)
    pub to: String,
    /// ABI-encoded call data
    pub data: Vec<u8>,
    pub gas_limit: u64,
    pub gas_price_wei: u128,
    pub nonce: u64,
    pub chain_id: u64,
}

/// Signed transaction bytes plus the identifier they will have on-chain
#[derive(Clone)]
pub struct SignedTransaction {
    pub tx_id: String,
    pub raw: Vec<u8>,
    pub nonce: u64,
}

impl std::fmt::Debug for SignedTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedTransaction")
            .field("tx_id", &self.tx_id)
            .field("raw_len", &self.raw.len())
            .field("nonce", &self.nonce)
            .finish()
    }
}

/// Handle for a broadcast transaction awaiting inclusion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedTransaction {
    pub tx_id: String,
    pub submitted_at: DateTime<Utc>,
}

/// Proof that a transaction was included in a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub tx_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub timestamp: DateTime<Utc>,
}

/// Ledger-side status of a transaction id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ConfirmationStatus {
    /// Included in a block and succeeded
    Confirmed(TransactionReceipt),

    /// Known to the network but not yet included
    Pending,

    /// Included but the contract call failed
    Reverted,

    /// Not known to the node (never broadcast, or dropped from the mempool)
    Unknown,
}

impl ConfirmationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmationStatus::Confirmed(_) => "confirmed",
            ConfirmationStatus::Pending => "pending",
            ConfirmationStatus::Reverted => "reverted",
            ConfirmationStatus::Unknown => "unknown",
        }
    }

    /// Whether the status can no longer change
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            ConfirmationStatus::Confirmed(_) | ConfirmationStatus::Reverted
        )
    }
}

/// Check that a string looks like a transaction id: `0x` followed by 64 hex chars
pub fn is_valid_tx_id(tx_id: &str) -> bool {
    match tx_id.strip_prefix("0x") {
        Some(hex) => hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_estimate_headroom() {
        let cost = CostEstimate::with_headroom(50_000, 30_000_000_000);
        assert_eq!(cost.gas_limit, 60_000);
        assert_eq!(cost.max_fee_wei(), 60_000u128 * 30_000_000_000u128);
    }

    #[test]
    fn test_receipt_serialization_omits_missing_block() {
        let receipt = TransactionReceipt {
            tx_id: format!("0x{}", "ab".repeat(32)),
            block_number: None,
            gas_used: 21_000,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&receipt).unwrap();
        assert!(json.get("blockNumber").is_none());
        assert_eq!(json["gasUsed"], 21_000);
    }

    #[test]
    fn test_confirmation_status_finality() {
        assert!(ConfirmationStatus::Reverted.is_final());
        assert!(!ConfirmationStatus::Pending.is_final());
        assert!(!ConfirmationStatus::Unknown.is_final());
        assert_eq!(ConfirmationStatus::Pending.as_str(), "pending");
    }

    #[test]
    fn test_tx_id_validation() {
        assert!(is_valid_tx_id(&format!("0x{}", "a".repeat(64))));
        assert!(!is_valid_tx_id(&"a".repeat(64)));
        assert!(!is_valid_tx_id("0x1234"));
        assert!(!is_valid_tx_id(&format!("0x{}", "z".repeat(64))));
    }

    #[test]
    fn test_signed_transaction_debug_hides_bytes() {
        let signed = SignedTransaction {
            tx_id: "0xabc".to_string(),
            raw: vec![0xde, 0xad, 0xbe, 0xef],
            nonce: 7,
        };
        let debug = format!("{:?}", signed);
        assert!(debug.contains("raw_len: 4"));
        assert!(!debug.contains("222"));
    }
}
