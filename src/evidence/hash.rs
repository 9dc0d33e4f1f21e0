use crate::error::{TrustSealError, TrustSealResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Number of hex characters in a SHA-256 digest
pub const DIGEST_HEX_LEN: usize = 64;

/// SHA-256 content digest as 64 lowercase hex characters
///
/// A `Digest` can only be obtained by hashing bytes or by parsing a string that
/// already has the canonical form, so every value in circulation is valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    /// Calculate SHA-256 digest of data in memory
    pub fn of_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hex::encode(hasher.finalize()))
    }

    /// Calculate SHA-256 digest of a file
    pub fn of_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let mut file = File::open(path)?;
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192];

        loop {
            let bytes_read = file.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(Self(hex::encode(hasher.finalize())))
    }

    /// Validate a caller-supplied digest
    ///
    /// Accepts exactly 64 lowercase hex characters. Prefixes, uppercase and
    /// surrounding whitespace are all rejected.
    pub fn parse(value: &str) -> TrustSealResult<Self> {
        if value.len() != DIGEST_HEX_LEN {
            return Err(TrustSealError::InvalidDigestFormat(format!(
                "expected {} hex characters, got {}",
                DIGEST_HEX_LEN,
                value.len()
            )));
        }

        if !value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(TrustSealError::InvalidDigestFormat(
                "digest must contain only lowercase hexadecimal characters".to_string(),
            ));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw 32-byte value used as the on-chain `bytes32` argument
    pub fn to_bytes32(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        // Cannot fail: every constructor yields 64 lowercase hex chars
        hex::decode_to_slice(&self.0, &mut out)
            .map(|()| out)
            .unwrap_or_default()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Digest {
    type Error = TrustSealError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Digest::parse(&value)
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}
