//! Error types for Authority calls and client configuration.

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to the Authority.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The Authority could not be reached.
    #[error("authority unreachable: {0}")]
    Transport(String),

    /// The request did not complete within the configured timeout.
    #[error("authority request timed out")]
    Timeout,

    /// The Authority answered with a body that is not a valid reply.
    #[error("malformed authority response: {0}")]
    MalformedResponse(String),

    /// The Authority refused a register or deregister call.
    #[error("authority rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// An in-process registry failed.
    #[error("registry error: {0}")]
    Registry(#[from] securewrap_registry::RegistryError),

    /// Client configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Builds a transport error, folding timeouts into [`ClientError::Timeout`].
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(e.to_string())
        }
    }
}
