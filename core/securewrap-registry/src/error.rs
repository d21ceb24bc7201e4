//! Error types for rule storage.

use thiserror::Error;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur while persisting or reading rules.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Database error from SQLite.
    #[error("storage error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A rule failed required-presence checks.
    #[error("invalid rule: {0}")]
    InvalidRule(#[from] securewrap_types::Error),

    /// A stored row could not be turned back into a rule.
    #[error("invalid stored data: {0}")]
    InvalidData(String),

    /// A thread panicked while holding the store lock.
    #[error("rule store lock poisoned")]
    Poisoned,
}
