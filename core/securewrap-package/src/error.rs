//! Error types for the package crate.

use thiserror::Error;

pub type PackageResult<T> = Result<T, PackageError>;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("envelope error: {0}")]
    Envelope(#[from] securewrap_crypto::CryptoError),

    #[error("no package trailer found")]
    NoTrailer,

    #[error("package trailer is corrupt: {0}")]
    CorruptTrailer(String),

    #[error("unsupported package format version {0}")]
    UnsupportedVersion(u32),

    #[error("manifest validation error: {0}")]
    ManifestInvalid(String),
}
