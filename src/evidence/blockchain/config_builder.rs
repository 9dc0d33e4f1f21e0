use super::config::{
    BlockchainConfig, BlockchainEnvironment, ChainConfig, LedgerTiming, WalletConfig,
    DEFAULT_MAX_PAYLOAD_BYTES, MAINNET_CHAIN_IDS, TESTNET_CHAIN_IDS,
};
use crate::error::{TrustSealError, TrustSealResult};
use url::Url;

/// Builder for constructing BlockchainConfig instances with a fluent API
///
/// # Example
/// ```
/// use trustseal::evidence::blockchain::{BlockchainConfigBuilder, BlockchainEnvironment, ChainConfig};
///
/// let config = BlockchainConfigBuilder::new()
///     .environment(BlockchainEnvironment::Testnet)
///     .chain(ChainConfig::polygon_amoy())
///     .contract_address("0x5FbDB2315678afecb367f032d93F642f64180aa3")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Default)]
pub struct BlockchainConfigBuilder {
    environment: Option<BlockchainEnvironment>,
    chain: Option<ChainConfig>,
    rpc_url: Option<String>,
    contract_address: Option<String>,
    explorer_url: Option<String>,
    wallet: Option<WalletConfig>,
    timing: Option<LedgerTiming>,
    max_payload_bytes: Option<usize>,
}

impl BlockchainConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the blockchain environment
    pub fn environment(mut self, env: BlockchainEnvironment) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the chain configuration
    pub fn chain(mut self, chain: ChainConfig) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Set the chain configuration by chain ID
    pub fn chain_id(mut self, chain_id: u64) -> TrustSealResult<Self> {
        let chain = ChainConfig::from_chain_id(chain_id).ok_or_else(|| {
            TrustSealError::ConfigError(format!("Unknown chain ID: {}", chain_id))
        })?;
        self.chain = Some(chain);
        Ok(self)
    }

    /// Override the preset's RPC endpoint
    pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    /// Set the deployed notary contract address
    pub fn contract_address(mut self, address: impl Into<String>) -> Self {
        self.contract_address = Some(address.into());
        self
    }

    /// Override the preset's block explorer base URL
    pub fn explorer_url(mut self, url: impl Into<String>) -> Self {
        self.explorer_url = Some(url.into());
        self
    }

    /// Set the expected wallet address
    pub fn wallet_address(mut self, address: impl Into<String>) -> Self {
        self.wallet = Some(WalletConfig {
            address: address.into(),
        });
        self
    }

    pub fn timing(mut self, timing: LedgerTiming) -> Self {
        self.timing = Some(timing);
        self
    }

    pub fn max_payload_bytes(mut self, limit: usize) -> Self {
        self.max_payload_bytes = Some(limit);
        self
    }

    /// Build the BlockchainConfig instance
    ///
    /// # Errors
    /// Returns `TrustSealError::ConfigError` if required fields are missing or invalid
    pub fn build(self) -> TrustSealResult<BlockchainConfig> {
        let environment = self.environment.unwrap_or(BlockchainEnvironment::Mock);
        let mut chain = self.chain.unwrap_or_else(ChainConfig::polygon_amoy);

        if let Some(rpc_url) = self.rpc_url {
            chain.rpc_url = rpc_url;
        }
        if let Some(contract_address) = self.contract_address {
            chain.contract_address = contract_address;
        }
        if let Some(explorer_url) = self.explorer_url {
            chain.explorer_url = explorer_url;
        }

        // Validate environment and chain compatibility
        match environment {
            BlockchainEnvironment::Mock => {
                // Mock accepts any chain
            }
            BlockchainEnvironment::Testnet => {
                if !TESTNET_CHAIN_IDS.contains(&chain.chain_id) {
                    return Err(TrustSealError::ConfigError(format!(
                        "Chain ID {} is not a valid testnet",
                        chain.chain_id
                    )));
                }
            }
            BlockchainEnvironment::Mainnet => {
                if !MAINNET_CHAIN_IDS.contains(&chain.chain_id) {
                    return Err(TrustSealError::ConfigError(format!(
                        "Chain ID {} is not a valid mainnet",
                        chain.chain_id
                    )));
                }
            }
        }

        if environment != BlockchainEnvironment::Mock {
            validate_url("RPC URL", &chain.rpc_url)?;
            validate_contract_address(&chain.contract_address)?;
        }
        validate_url("explorer URL", &chain.explorer_url)?;

        let timing = self.timing.unwrap_or_default();
        if timing.rpc_timeout_ms == 0 || timing.poll_interval_ms == 0 {
            return Err(TrustSealError::ConfigError(
                "RPC timeout and poll interval must be non-zero".to_string(),
            ));
        }
        if timing.confirmations == 0 {
            return Err(TrustSealError::ConfigError(
                "At least one confirmation is required".to_string(),
            ));
        }

        Ok(BlockchainConfig {
            environment,
            chain,
            wallet: self.wallet,
            timing,
            max_payload_bytes: self.max_payload_bytes.unwrap_or(DEFAULT_MAX_PAYLOAD_BYTES),
        })
    }
}

fn validate_url(label: &str, value: &str) -> TrustSealResult<()> {
    let url = Url::parse(value)
        .map_err(|e| TrustSealError::ConfigError(format!("Invalid {}: {}", label, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(TrustSealError::ConfigError(format!(
            "Invalid {}: unsupported scheme '{}'",
            label, other
        ))),
    }
}

fn validate_contract_address(address: &str) -> TrustSealResult<()> {
    let hex = address.strip_prefix("0x").ok_or_else(|| {
        TrustSealError::ConfigError("Contract address must be 0x-prefixed".to_string())
    })?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(TrustSealError::ConfigError(
            "Contract address must be 40 hex characters".to_string(),
        ));
    }
    if hex.chars().all(|c| c == '0') {
        return Err(TrustSealError::ConfigError(
            "Contract address is not set (zero address)".to_string(),
        ));
    }
    Ok(())
}
