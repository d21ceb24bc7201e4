//! Envelope encryption for SecureWrap packages.
//!
//! A package payload is sealed with ChaCha20-Poly1305 under the
//! deployment-wide [`DeploymentKey`]. Opening is all-or-nothing: a truncated
//! or modified envelope yields [`CryptoError::Authentication`] and never
//! partial plaintext.
//!
//! The key is shared by every package of a deployment. It is not derived from
//! the package password; payload confidentiality therefore rests entirely on
//! keeping the deployment key secret.

mod envelope;
mod error;
mod key;

pub use envelope::{open, open_bytes, seal, EncryptedEnvelope, NONCE_SIZE, TAG_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use key::{DeploymentKey, KEY_SIZE};
