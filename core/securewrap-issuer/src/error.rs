//! Error types for issuing packages.

use std::path::PathBuf;

use thiserror::Error;

pub type IssuerResult<T> = Result<T, IssuerError>;

#[derive(Debug, Error)]
pub enum IssuerError {
    /// The operator supplied an unusable file or rule.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("encryption failed: {0}")]
    Crypto(#[from] securewrap_crypto::CryptoError),

    #[error("package build failed: {0}")]
    Package(#[from] securewrap_package::PackageError),

    /// The Authority did not accept the rule. No artifact was written.
    #[error("registration failed: {0}")]
    Registration(#[source] securewrap_client::ClientError),

    /// The artifact could not be written after the rule was registered.
    #[error(
        "failed to write {}: {source} (registration rolled back: {rolled_back})",
        .path.display()
    )]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        rolled_back: bool,
    },
}
