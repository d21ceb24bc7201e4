//! SecureWrap issuer.
//!
//! Turns a plaintext file and an access rule into a registered,
//! self-contained package artifact. See [`Issuer`] for the ordering
//! guarantees between registration and the artifact on disk.

mod error;
mod issue;

pub use error::{IssuerError, IssuerResult};
pub use issue::{IssueRequest, IssuedPackage, Issuer};
