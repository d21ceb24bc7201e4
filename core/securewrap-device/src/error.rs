//! Error types for fingerprint derivation.

use thiserror::Error;

/// Fingerprinting errors.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// No interface is up, non-loopback and carrying a hardware address,
    /// or no non-loopback IPv4 address exists.
    #[error("no active network interface: {0}")]
    NoActiveInterface(String),

    /// The OS refused to enumerate interfaces.
    #[error("interface enumeration failed: {0}")]
    Enumeration(#[from] std::io::Error),

    /// Interface enumeration is not implemented on this platform.
    #[error("interface enumeration unsupported on {0}")]
    Unsupported(&'static str),
}

/// Result type for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;
