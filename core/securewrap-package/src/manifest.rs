//! Package manifest (TOML) embedded in every artifact.

use std::path::Path;

use securewrap_types::PackageId;
use serde::{Deserialize, Serialize};

use crate::error::{PackageError, PackageResult};

/// Current artifact format version.
pub const FORMAT_VERSION: u32 = 1;

/// Name written when the recorded file name is unusable.
pub const FALLBACK_FILE_NAME: &str = "decrypted_file.dat";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    pub format_version: u32,
    pub package_id: PackageId,
    /// Base name the plaintext is restored under. Never contains a path.
    pub original_file_name: String,
    /// Authority the package was registered with.
    pub authority_url: String,
}

impl PackageManifest {
    /// Builds a manifest, keeping only the base name of `original_file`.
    pub fn new(
        package_id: PackageId,
        original_file: impl AsRef<Path>,
        authority_url: impl Into<String>,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            package_id,
            original_file_name: base_name(original_file.as_ref()),
            authority_url: authority_url.into(),
        }
    }

    pub fn validate(&self) -> PackageResult<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(PackageError::UnsupportedVersion(self.format_version));
        }
        if self.package_id.as_str().trim().is_empty() {
            return Err(PackageError::ManifestInvalid("package_id is empty".into()));
        }
        if self.authority_url.trim().is_empty() {
            return Err(PackageError::ManifestInvalid("authority_url is empty".into()));
        }
        Ok(())
    }

    /// The file name to restore the plaintext under, with any directory
    /// components stripped.
    pub fn output_file_name(&self) -> String {
        base_name(Path::new(&self.original_file_name))
    }

    pub fn to_toml(&self) -> PackageResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn from_toml(contents: &str) -> PackageResult<Self> {
        let manifest: Self = toml::from_str(contents)?;
        manifest.validate()?;
        Ok(manifest)
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.trim().is_empty() && n != "..")
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

/// Artifact file name for a wrapped file: `Secure-<name before first dot>`
/// plus the platform's executable suffix.
pub fn artifact_file_name(original_file: &Path) -> String {
    let name = original_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.split('.').next().filter(|s| !s.is_empty()).unwrap_or("package");
    format!("Secure-{stem}{}", std::env::consts::EXE_SUFFIX)
}
