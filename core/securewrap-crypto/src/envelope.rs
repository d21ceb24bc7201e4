//! Payload sealing using ChaCha20-Poly1305.
//!
//! Serialized layout: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
//! The nonce travels with the ciphertext so `open` needs nothing but the key.

use crate::error::{CryptoError, CryptoResult};
use crate::key::DeploymentKey;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Size of nonce in bytes (96 bits for ChaCha20-Poly1305).
pub const NONCE_SIZE: usize = 12;

/// Size of authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// A sealed payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    /// Fresh random nonce, unique per seal.
    pub nonce: [u8; NONCE_SIZE],
    /// The ciphertext with the authentication tag appended.
    pub ciphertext: Vec<u8>,
}

impl EncryptedEnvelope {
    /// Returns the serialized size.
    pub fn len(&self) -> usize {
        NONCE_SIZE + self.ciphertext.len()
    }

    /// Returns true if the ciphertext is empty.
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }

    /// Serializes with the nonce prepended.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len());
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Splits serialized bytes back into nonce and ciphertext.
    ///
    /// Anything shorter than a nonce plus a tag cannot be a sealed payload and
    /// is reported as an authentication failure.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::Authentication);
        }

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[..NONCE_SIZE]);
        let ciphertext = bytes[NONCE_SIZE..].to_vec();

        Ok(Self { nonce, ciphertext })
    }
}

/// Seals `plaintext` under the deployment key with a fresh nonce.
pub fn seal(plaintext: &[u8], key: &DeploymentKey) -> CryptoResult<EncryptedEnvelope> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    Ok(EncryptedEnvelope {
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Opens an envelope. Fails closed: no plaintext is returned unless the tag verifies.
pub fn open(envelope: &EncryptedEnvelope, key: &DeploymentKey) -> CryptoResult<Vec<u8>> {
    if envelope.ciphertext.len() < TAG_SIZE {
        return Err(CryptoError::Authentication);
    }

    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
    let nonce = Nonce::from_slice(&envelope.nonce);

    cipher
        .decrypt(nonce, envelope.ciphertext.as_ref())
        .map_err(|_| CryptoError::Authentication)
}

/// Opens a serialized envelope (`nonce || ciphertext || tag`).
pub fn open_bytes(bytes: &[u8], key: &DeploymentKey) -> CryptoResult<Vec<u8>> {
    let envelope = EncryptedEnvelope::from_bytes(bytes)?;
    open(&envelope, key)
}
