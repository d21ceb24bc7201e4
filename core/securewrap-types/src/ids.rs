//! Package identifiers.
//!
//! A package id is derived from the wrapped file's stem and the issue time
//! in whole seconds, e.g. `report-1700000000`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::Error;

/// Identifier of a single issued package, unique per Authority.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(String);

impl PackageId {
    /// Creates a package id for `file` issued now.
    #[must_use]
    pub fn for_file(file: &Path) -> Self {
        Self::for_file_at(file, chrono::Utc::now().timestamp())
    }

    /// Creates a package id for `file` issued at `unix_secs`.
    #[must_use]
    pub fn for_file_at(file: &Path, unix_secs: i64) -> Self {
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "package".to_string());
        Self(format!("{stem}-{unix_secs}"))
    }

    /// Parses a package id, rejecting empty or whitespace-only input.
    pub fn parse(s: &str) -> Result<Self, Error> {
        if s.trim().is_empty() {
            return Err(Error::InvalidPackageId("package id must not be empty".into()));
        }
        Ok(Self(s.to_string()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PackageId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for PackageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
