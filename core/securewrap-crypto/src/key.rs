//! The deployment key.
//!
//! Every package issued by one deployment is sealed under the same 256-bit key.
//! The key is configuration: it is handed to the Issuer and the Agent when they
//! are constructed and is never derived from a package password.

use crate::error::{CryptoError, CryptoResult};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the deployment key in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// The deployment-wide symmetric key, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DeploymentKey {
    bytes: [u8; KEY_SIZE],
}

impl DeploymentKey {
    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Creates a key from a slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let array: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self::from_bytes(array))
    }

    /// Generates a fresh random key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Decodes a key from standard base64.
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let mut decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidKey(format!("invalid base64: {e}")))?;
        let key = Self::from_slice(&decoded);
        decoded.zeroize();
        key
    }

    /// Encodes the key as standard base64.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.bytes)
    }

    /// Returns the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for DeploymentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for DeploymentKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for DeploymentKey {}
