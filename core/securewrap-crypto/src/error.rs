//! Error types for the envelope layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Sealing failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// The envelope is truncated or its tag does not verify
    /// (wrong key, corrupted or tampered data).
    #[error("envelope authentication failed")]
    Authentication,

    /// Key material could not be decoded.
    #[error("invalid deployment key: {0}")]
    InvalidKey(String),

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
}

impl CryptoError {
    /// Returns true for integrity failures on `open`.
    #[must_use]
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication)
    }
}
