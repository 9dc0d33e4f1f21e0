use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Blockchain configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockchainConfig {
    /// Environment (mock, testnet, mainnet)
    pub environment: BlockchainEnvironment,

    /// Chain configuration
    pub chain: ChainConfig,

    /// Wallet configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet: Option<WalletConfig>,

    /// Network timing
    pub timing: LedgerTiming,

    /// Maximum size of the serialized metadata payload in bytes
    pub max_payload_bytes: usize,
}

/// Blockchain environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BlockchainEnvironment {
    /// In-process ledger for development (no real blockchain)
    Mock,

    /// Testnet for testing with free tokens
    Testnet,

    /// Mainnet for production (real costs)
    Mainnet,
}

impl BlockchainEnvironment {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mock" => Some(BlockchainEnvironment::Mock),
            "testnet" => Some(BlockchainEnvironment::Testnet),
            "mainnet" => Some(BlockchainEnvironment::Mainnet),
            _ => None,
        }
    }
}

/// Chain configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    pub contract_address: String,
    pub explorer_url: String,
}

/// Wallet configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Expected public wallet address, checked against the loaded key
    pub address: String,
    // The private key itself is loaded by WalletManager and never stored here
}

/// Timeouts and polling cadence for ledger calls
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerTiming {
    /// Timeout for a single JSON-RPC round-trip
    pub rpc_timeout_ms: u64,

    /// Interval between receipt polls while awaiting confirmation
    pub poll_interval_ms: u64,

    /// Number of blocks (including the inclusion block) before a transaction counts as confirmed
    pub confirmations: u64,
}

impl LedgerTiming {
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for LedgerTiming {
    fn default() -> Self {
        Self {
            rpc_timeout_ms: 10_000,
            poll_interval_ms: 2_000,
            confirmations: 1,
        }
    }
}

/// Default metadata payload limit (16 KiB)
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 16 * 1024;

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            environment: BlockchainEnvironment::Mock,
            chain: ChainConfig::polygon_amoy(),
            wallet: None,
            timing: LedgerTiming::default(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

impl ChainConfig {
    /// Polygon Amoy testnet (free testing)
    pub fn polygon_amoy() -> Self {
        Self {
            chain_id: 80002,
            name: "Polygon Amoy".to_string(),
            rpc_url: "https://rpc-amoy.polygon.technology".to_string(),
            contract_address: "0x0000000000000000000000000000000000000000".to_string(),
            explorer_url: "https://amoy.polygonscan.com".to_string(),
        }
    }

    /// Ethereum Sepolia testnet
    pub fn sepolia() -> Self {
        Self {
            chain_id: 11155111,
            name: "Sepolia".to_string(),
            rpc_url: "https://rpc.sepolia.org".to_string(),
            contract_address: "0x0000000000000000000000000000000000000000".to_string(),
            explorer_url: "https://sepolia.etherscan.io".to_string(),
        }
    }

    /// Polygon mainnet (low cost)
    pub fn polygon_mainnet() -> Self {
        Self {
            chain_id: 137,
            name: "Polygon".to_string(),
            rpc_url: "https://polygon-rpc.com".to_string(),
            contract_address: "0x0000000000000000000000000000000000000000".to_string(),
            explorer_url: "https://polygonscan.com".to_string(),
        }
    }

    /// Ethereum mainnet (high cost, maximum security)
    pub fn ethereum_mainnet() -> Self {
        Self {
            chain_id: 1,
            name: "Ethereum".to_string(),
            rpc_url: "https://eth.llamarpc.com".to_string(),
            contract_address: "0x0000000000000000000000000000000000000000".to_string(),
            explorer_url: "https://etherscan.io".to_string(),
        }
    }

    /// Get all available chains
    pub fn all_chains() -> Vec<Self> {
        vec![
            Self::polygon_amoy(),
            Self::sepolia(),
            Self::polygon_mainnet(),
            Self::ethereum_mainnet(),
        ]
    }

    /// Get chain by ID
    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        Self::all_chains().into_iter().find(|c| c.chain_id == chain_id)
    }

    pub fn is_testnet(&self) -> bool {
        TESTNET_CHAIN_IDS.contains(&self.chain_id)
    }

    /// Explorer page for a transaction
    pub fn tx_explorer_url(&self, tx_id: &str) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), tx_id)
    }
}

pub const TESTNET_CHAIN_IDS: [u64; 2] = [80002, 11155111];
pub const MAINNET_CHAIN_IDS: [u64; 2] = [1, 137];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BlockchainConfig::default();
        assert_eq!(config.environment, BlockchainEnvironment::Mock);
        assert_eq!(config.max_payload_bytes, DEFAULT_MAX_PAYLOAD_BYTES);
        assert_eq!(config.timing.confirmations, 1);
    }

    #[test]
    fn test_chain_configs() {
        let polygon = ChainConfig::polygon_mainnet();
        assert_eq!(polygon.chain_id, 137);
        assert!(!polygon.is_testnet());

        let amoy = ChainConfig::polygon_amoy();
        assert!(amoy.is_testnet());
    }

    #[test]
    fn test_from_chain_id() {
        let sepolia = ChainConfig::from_chain_id(11155111).unwrap();
        assert_eq!(sepolia.name, "Sepolia");

        assert!(ChainConfig::from_chain_id(99999).is_none());
    }

    #[test]
    fn test_tx_explorer_url() {
        let mut chain = ChainConfig::polygon_mainnet();
        assert_eq!(
            chain.tx_explorer_url("0xabc123"),
            "https://polygonscan.com/tx/0xabc123"
        );

        chain.explorer_url = "https://polygonscan.com/".to_string();
        assert_eq!(
            chain.tx_explorer_url("0xabc123"),
            "https://polygonscan.com/tx/0xabc123"
        );
    }

    #[test]
    fn test_environment_from_str() {
        assert_eq!(
            BlockchainEnvironment::from_str("Testnet"),
            Some(BlockchainEnvironment::Testnet)
        );
        assert_eq!(
            BlockchainEnvironment::from_str("mock"),
            Some(BlockchainEnvironment::Mock)
        );
        assert_eq!(BlockchainEnvironment::from_str("devnet"), None);
    }

    #[test]
    fn test_chain_serialized_fields() {
        let json = serde_json::to_value(ChainConfig::sepolia()).unwrap();
        let mut keys: Vec<&str> = json
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            ["chain_id", "contract_address", "explorer_url", "name", "rpc_url"]
        );
    }

    #[test]
    fn test_config_serialization() {
        let config = BlockchainConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: BlockchainConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config.environment, deserialized.environment);
        assert_eq!(config.timing, deserialized.timing);
    }
}
