use serde::{Deserialize, Serialize};
use std::fmt;

/// The network identity of a device: one IPv4 address and one hardware address.
///
/// Both parts are kept as the exact strings the device reported. The Authority
/// compares them byte for byte, so no normalization happens here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceFingerprint {
    /// IPv4 address in dotted-quad form.
    pub ip: String,
    /// Hardware (MAC) address.
    pub mac: String,
}

impl DeviceFingerprint {
    #[must_use]
    pub fn new(ip: impl Into<String>, mac: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            mac: mac.into(),
        }
    }
}

impl fmt::Display for DeviceFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.ip, self.mac)
    }
}
