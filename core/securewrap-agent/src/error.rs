//! Failures that end an agent run in destruction.

use thiserror::Error;

pub type AgentResult<T> = Result<T, AgentError>;

/// Which Authority call produced a denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    PreCheck,
    Verify,
}

#[derive(Debug, Error)]
pub enum AgentError {
    /// No usable network interface.
    #[error("fingerprint error: {0}")]
    Fingerprint(#[from] securewrap_device::DeviceError),

    /// The Authority was unreachable, timed out or answered garbage.
    #[error("transport error: {0}")]
    Transport(#[from] securewrap_client::ClientError),

    /// The Authority explicitly refused.
    #[error("denied at {stage:?}: {}", .reason.as_deref().unwrap_or("no reason given"))]
    Denied { stage: Stage, reason: Option<String> },

    /// The envelope failed its integrity check.
    #[error("authentication error: {0}")]
    Authentication(#[from] securewrap_crypto::CryptoError),

    /// The artifact trailer could not be read.
    #[error("package error: {0}")]
    Package(#[from] securewrap_package::PackageError),

    /// The plaintext could not be written out.
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}
