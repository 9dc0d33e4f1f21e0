use crate::error::{TrustSealError, TrustSealResult};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable holding the ledger private key
pub const PRIVATE_KEY_ENV: &str = "TRUSTSEAL_PRIVATE_KEY";

/// Where the ledger private key is read from
#[derive(Debug, Clone)]
pub enum KeySource {
    /// Environment variable name
    Env(String),

    /// File containing the hex key
    File(PathBuf),

    /// Key material already read by the caller (e.g. from a CLI flag bound to an env var)
    Inline(String),
}

/// Signing key and derived address, loaded once at startup
///
/// `Debug` prints only the address.
#[derive(Clone)]
pub struct LedgerCredentials {
    wallet: LocalWallet,
}

impl LedgerCredentials {
    /// Bind the credentials to a chain id for EIP-155 signatures
    pub fn for_chain(self, chain_id: u64) -> Self {
        Self {
            wallet: self.wallet.with_chain_id(chain_id),
        }
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn address_hex(&self) -> String {
        format!("0x{:x}", self.wallet.address())
    }

    pub(crate) fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }
}

impl fmt::Debug for LedgerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerCredentials")
            .field("address", &self.address_hex())
            .finish_non_exhaustive()
    }
}

/// Wallet manager for blockchain operations
pub struct WalletManager;

impl WalletManager {
    /// Load credentials from the given source
    ///
    /// # Errors
    /// Returns `TrustSealError::WalletError` if the key is missing or malformed.
    /// Error messages never contain key material.
    pub fn load(source: &KeySource) -> TrustSealResult<LedgerCredentials> {
        let raw = match source {
            KeySource::Env(var) => std::env::var(var).map_err(|_| {
                TrustSealError::WalletError(format!("Environment variable {} is not set", var))
            })?,
            KeySource::File(path) => Self::read_key_file(path)?,
            KeySource::Inline(key) => key.clone(),
        };

        Self::from_private_key(raw.trim())
    }

    /// Build credentials from a hex private key (with or without 0x prefix)
    pub fn from_private_key(private_key: &str) -> TrustSealResult<LedgerCredentials> {
        Self::validate_private_key(private_key)?;

        let wallet: LocalWallet = private_key.trim_start_matches("0x").parse().map_err(|_| {
            TrustSealError::WalletError("Private key is not a valid secp256k1 key".to_string())
        })?;

        Ok(LedgerCredentials { wallet })
    }

    /// Generate throwaway credentials (development and tests)
    pub fn random() -> LedgerCredentials {
        LedgerCredentials {
            wallet: LocalWallet::new(&mut rand::thread_rng()),
        }
    }

    /// Check the loaded key derives the configured address
    pub fn verify_address(
        credentials: &LedgerCredentials,
        expected: &str,
    ) -> TrustSealResult<()> {
        let expected = expected.trim().to_lowercase();
        if credentials.address_hex() != expected {
            return Err(TrustSealError::WalletError(format!(
                "Private key derives address {}, but {} was configured",
                credentials.address_hex(),
                expected
            )));
        }
        Ok(())
    }

    /// Validate a private key format
    ///
    /// Placeholder values such as `YOUR_TESTNET_PRIVATE_KEY` fail here.
    pub fn validate_private_key(private_key: &str) -> TrustSealResult<()> {
        let key = private_key.trim_start_matches("0x");

        // Check length (64 hex characters = 32 bytes)
        if key.len() != 64 {
            return Err(TrustSealError::WalletError(
                "Private key must be 64 hex characters (32 bytes)".to_string(),
            ));
        }

        if hex::decode(key).is_err() {
            return Err(TrustSealError::WalletError(
                "Private key must be valid hexadecimal".to_string(),
            ));
        }

        Ok(())
    }

    fn read_key_file(path: &Path) -> TrustSealResult<String> {
        std::fs::read_to_string(path).map_err(|e| {
            TrustSealError::WalletError(format!(
                "Failed to read key file {}: {}",
                path.display(),
                e.kind()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TEST_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[test]
    fn test_validate_private_key_valid() {
        assert!(WalletManager::validate_private_key(TEST_KEY).is_ok());
        assert!(WalletManager::validate_private_key(TEST_KEY.trim_start_matches("0x")).is_ok());
    }

    #[test]
    fn test_validate_private_key_too_short() {
        assert!(WalletManager::validate_private_key("0x1234").is_err());
    }

    #[test]
    fn test_validate_private_key_invalid_hex() {
        let key = "0xZZZZ567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";
        assert!(WalletManager::validate_private_key(key).is_err());
    }

    #[test]
    fn test_placeholder_key_rejected() {
        let result = WalletManager::from_private_key("YOUR_TESTNET_PRIVATE_KEY");
        assert!(matches!(result.unwrap_err(), TrustSealError::WalletError(_)));
    }

    #[test]
    fn test_derive_address() {
        let credentials = WalletManager::from_private_key(TEST_KEY).unwrap();
        let address = credentials.address_hex();
        assert!(address.starts_with("0x"));
        assert_eq!(address.len(), 42);
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let credentials = WalletManager::from_private_key(TEST_KEY).unwrap();
        let debug = format!("{:?}", credentials);
        assert!(debug.contains(&credentials.address_hex()));
        assert!(!debug.contains(TEST_KEY.trim_start_matches("0x")));
    }

    #[test]
    fn test_errors_do_not_leak_key() {
        let bad_key = "0xgg0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
        let err = WalletManager::from_private_key(bad_key).unwrap_err();
        assert!(!err.to_string().contains("0883a69102937d"));
    }

    #[test]
    fn test_load_from_file() {
        let mut key_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(key_file, "{}", TEST_KEY).unwrap();

        let credentials =
            WalletManager::load(&KeySource::File(key_file.path().to_path_buf())).unwrap();
        let expected = WalletManager::from_private_key(TEST_KEY).unwrap();
        assert_eq!(credentials.address(), expected.address());
    }

    #[test]
    fn test_load_missing_env() {
        let result = WalletManager::load(&KeySource::Env(
            "TRUSTSEAL_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
        ));
        assert!(matches!(result.unwrap_err(), TrustSealError::WalletError(_)));
    }

    #[test]
    fn test_verify_address() {
        let credentials = WalletManager::from_private_key(TEST_KEY).unwrap();
        let address = credentials.address_hex();

        assert!(WalletManager::verify_address(&credentials, &address.to_uppercase()).is_ok());
        assert!(WalletManager::verify_address(
            &credentials,
            "0x1234567890abcdef1234567890abcdef12345678"
        )
        .is_err());
    }
}
