//! JSON bodies exchanged with the Authority.
//!
//! | Route        | Request             | Response                        |
//! |--------------|---------------------|---------------------------------|
//! | `/register`  | [`RegisterRequest`] | [`StatusResponse`] / [`ErrorResponse`] |
//! | `/pre-check` | [`PreCheckRequest`] | [`Decision`](crate::Decision)   |
//! | `/verify`    | [`VerifyRequest`]   | [`Decision`](crate::Decision)   |
//! | `/deregister`| [`DeregisterRequest`]| [`StatusResponse`]             |
//! | `/health`    | -                   | [`StatusResponse`]              |
//!
//! `package_id` also accepts the legacy name `file_id`.

use serde::{Deserialize, Serialize};

use crate::{AccessRule, DeviceFingerprint, Error, PackageId};

pub const REGISTER_PATH: &str = "/register";
pub const PRE_CHECK_PATH: &str = "/pre-check";
pub const VERIFY_PATH: &str = "/verify";
pub const DEREGISTER_PATH: &str = "/deregister";
pub const HEALTH_PATH: &str = "/health";

/// Registration carries the full rule.
pub type RegisterRequest = AccessRule;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreCheckRequest {
    #[serde(alias = "file_id")]
    pub package_id: PackageId,
    pub ip: String,
    pub mac: String,
}

impl PreCheckRequest {
    #[must_use]
    pub fn new(package_id: PackageId, fingerprint: &DeviceFingerprint) -> Self {
        Self {
            package_id,
            ip: fingerprint.ip.clone(),
            mac: fingerprint.mac.clone(),
        }
    }

    #[must_use]
    pub fn fingerprint(&self) -> DeviceFingerprint {
        DeviceFingerprint::new(self.ip.clone(), self.mac.clone())
    }

    pub fn validate(&self) -> Result<(), Error> {
        require_id(&self.package_id)?;
        require(&self.ip, "ip")?;
        require(&self.mac, "mac")
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    #[serde(alias = "file_id")]
    pub package_id: PackageId,
    pub password: String,
    pub ip: String,
    pub mac: String,
}

impl VerifyRequest {
    #[must_use]
    pub fn new(package_id: PackageId, password: &str, fingerprint: &DeviceFingerprint) -> Self {
        Self {
            package_id,
            password: password.to_string(),
            ip: fingerprint.ip.clone(),
            mac: fingerprint.mac.clone(),
        }
    }

    #[must_use]
    pub fn fingerprint(&self) -> DeviceFingerprint {
        DeviceFingerprint::new(self.ip.clone(), self.mac.clone())
    }

    pub fn validate(&self) -> Result<(), Error> {
        require_id(&self.package_id)?;
        require(&self.password, "password")?;
        require(&self.ip, "ip")?;
        require(&self.mac, "mac")
    }
}

impl std::fmt::Debug for VerifyRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyRequest")
            .field("package_id", &self.package_id)
            .field("password", &"[REDACTED]")
            .field("ip", &self.ip)
            .field("mac", &self.mac)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeregisterRequest {
    #[serde(alias = "file_id")]
    pub package_id: PackageId,
}

impl DeregisterRequest {
    pub fn validate(&self) -> Result<(), Error> {
        require_id(&self.package_id)
    }
}

/// Status values used by the non-decision routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Registered,
    Deregistered,
    Ok,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: Status,
}

impl StatusResponse {
    #[must_use]
    pub const fn new(status: Status) -> Self {
        Self { status }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Presence only; whitespace counts as a value, as it does at registration.
fn require(value: &str, field: &'static str) -> Result<(), Error> {
    if value.is_empty() {
        Err(Error::MissingField(field))
    } else {
        Ok(())
    }
}

fn require_id(id: &PackageId) -> Result<(), Error> {
    if id.as_str().trim().is_empty() {
        Err(Error::MissingField("package_id"))
    } else {
        Ok(())
    }
}
