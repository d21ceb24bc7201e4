//! SecureWrap package artifacts.
//!
//! A package is a single executable: the agent stub followed by a trailer
//! holding the [`PackageManifest`] and the encrypted payload. There is no
//! side-car manifest file.

mod artifact;
mod error;
mod manifest;

pub use artifact::{FOOTER_LEN, PackageArtifact, TRAILER_MAGIC};
pub use error::{PackageError, PackageResult};
pub use manifest::{FALLBACK_FILE_NAME, FORMAT_VERSION, PackageManifest, artifact_file_name};
