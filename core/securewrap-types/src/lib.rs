//! Core type definitions for SecureWrap.
//!
//! This crate defines the types shared by every role in the protocol:
//! - Package identifiers
//! - Device fingerprints (IP + MAC)
//! - Access rules as registered with the Authority
//! - Authorization decisions
//! - Request/response bodies exchanged with the Authority over HTTP

mod decision;
mod fingerprint;
mod ids;
mod rule;
pub mod wire;

pub use decision::{Decision, REASON_CREDENTIALS_MISMATCH, REASON_NOT_FOUND};
pub use fingerprint::DeviceFingerprint;
pub use ids::PackageId;
pub use rule::AccessRule;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid package id: {0}")]
    InvalidPackageId(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),
}
