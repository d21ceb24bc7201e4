//! Device fingerprint derivation.
//!
//! The fingerprint pairs the hardware address of the first active,
//! non-loopback interface with the first non-loopback IPv4 address found on
//! any interface. It is recomputed on every call; nothing is cached, so two
//! calls straddling a network change may disagree.

use crate::error::{DeviceError, DeviceResult};
use crate::interface::{InterfaceSource, NetworkInterface, SystemInterfaces};
use securewrap_types::DeviceFingerprint;
use std::net::IpAddr;
use tracing::debug;

/// Derives the fingerprint of this machine.
pub fn derive_fingerprint() -> DeviceResult<DeviceFingerprint> {
    derive_fingerprint_from(&SystemInterfaces)
}

/// Derives a fingerprint from an arbitrary interface source.
pub fn derive_fingerprint_from(source: &dyn InterfaceSource) -> DeviceResult<DeviceFingerprint> {
    let interfaces = source.interfaces()?;

    let mac = select_mac(&interfaces).ok_or_else(|| {
        DeviceError::NoActiveInterface("no active MAC address found".to_string())
    })?;
    let ip = select_ip(&interfaces).ok_or_else(|| {
        DeviceError::NoActiveInterface("no non-loopback IPv4 address found".to_string())
    })?;

    let fingerprint = DeviceFingerprint::new(ip, mac);
    debug!("Derived device fingerprint {}", fingerprint);
    Ok(fingerprint)
}

/// Hardware address of the first interface that is up, not loopback, and has one.
fn select_mac(interfaces: &[NetworkInterface]) -> Option<String> {
    interfaces
        .iter()
        .filter(|i| i.is_up && !i.is_loopback)
        .find_map(|i| i.mac.clone().filter(|mac| !mac.is_empty()))
}

/// First non-loopback IPv4 address across all interfaces.
fn select_ip(interfaces: &[NetworkInterface]) -> Option<String> {
    interfaces
        .iter()
        .flat_map(|i| i.addresses.iter())
        .find_map(|addr| match addr {
            IpAddr::V4(v4) if !v4.is_loopback() => Some(v4.to_string()),
            _ => None,
        })
}
