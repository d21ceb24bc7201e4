//! Client side of the SecureWrap Authority protocol.
//!
//! [`Authority`] is the seam between the issuer/agent logic and the rule
//! store: [`HttpAuthority`] talks to a remote Authority with a request
//! timeout, [`LocalAuthority`] drives a registry in-process.

mod authority;
mod config;
mod error;
mod http;

pub use authority::{Authority, LocalAuthority};
pub use config::{
    ClientConfig, DEFAULT_AUTHORITY_URL, DEFAULT_TIMEOUT_SECS, ENV_AUTHORITY_URL,
    ENV_DEPLOYMENT_KEY, ENV_TIMEOUT_SECS,
};
pub use error::{ClientError, ClientResult};
pub use http::HttpAuthority;
