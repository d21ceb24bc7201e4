//! Device fingerprinting for SecureWrap.
//!
//! A package is bound to the network identity of one device: the MAC address
//! of its first active, non-loopback interface and its first non-loopback
//! IPv4 address. Failing to find either is an error, never an empty
//! fingerprint, so callers cannot mistake "unknown device" for "no match".

mod error;
mod fingerprint;
mod interface;

pub use error::{DeviceError, DeviceResult};
pub use fingerprint::{derive_fingerprint, derive_fingerprint_from};
pub use interface::{InterfaceSource, NetworkInterface, StaticInterfaces, SystemInterfaces};
