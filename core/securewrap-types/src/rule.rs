//! Access rules.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{DeviceFingerprint, Error, PackageId};

/// The authorization rule for one package.
///
/// Stored by the Authority keyed by `package_id`. Re-registering a package
/// replaces every field at once.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRule {
    #[serde(alias = "file_id")]
    pub package_id: PackageId,
    pub password: String,
    pub ip: String,
    pub mac: String,
}

impl AccessRule {
    #[must_use]
    pub fn new(
        package_id: PackageId,
        password: impl Into<String>,
        fingerprint: DeviceFingerprint,
    ) -> Self {
        Self {
            package_id,
            password: password.into(),
            ip: fingerprint.ip,
            mac: fingerprint.mac,
        }
    }

    /// Checks that every field is present. Contents are not validated further.
    pub fn validate(&self) -> Result<(), Error> {
        if self.package_id.as_str().trim().is_empty() {
            return Err(Error::MissingField("package_id"));
        }
        if self.password.is_empty() {
            return Err(Error::MissingField("password"));
        }
        if self.ip.is_empty() {
            return Err(Error::MissingField("ip"));
        }
        if self.mac.is_empty() {
            return Err(Error::MissingField("mac"));
        }
        Ok(())
    }

    /// Returns the fingerprint this rule is bound to.
    #[must_use]
    pub fn fingerprint(&self) -> DeviceFingerprint {
        DeviceFingerprint::new(self.ip.clone(), self.mac.clone())
    }

    /// Exact comparison of IP and MAC.
    #[must_use]
    pub fn matches_fingerprint(&self, fingerprint: &DeviceFingerprint) -> bool {
        self.ip == fingerprint.ip && self.mac == fingerprint.mac
    }

    /// Exact comparison of password, IP and MAC.
    #[must_use]
    pub fn matches_credentials(&self, password: &str, fingerprint: &DeviceFingerprint) -> bool {
        self.password == password && self.matches_fingerprint(fingerprint)
    }
}

impl fmt::Debug for AccessRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessRule")
            .field("package_id", &self.package_id)
            .field("password", &"[REDACTED]")
            .field("ip", &self.ip)
            .field("mac", &self.mac)
            .finish()
    }
}
