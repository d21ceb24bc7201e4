//! Local network interface enumeration.

use crate::error::{DeviceError, DeviceResult};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// One network interface as reported by the OS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterface {
    /// Interface name (e.g. `eth0`, `en0`).
    pub name: String,
    /// Administratively up.
    pub is_up: bool,
    /// Loopback interface.
    pub is_loopback: bool,
    /// Hardware address, lowercase colon-separated hex.
    pub mac: Option<String>,
    /// Addresses bound to this interface, in OS order.
    pub addresses: Vec<IpAddr>,
}

/// Source of the interface list, in OS order.
pub trait InterfaceSource: Send + Sync {
    fn interfaces(&self) -> DeviceResult<Vec<NetworkInterface>>;
}

/// Reads interfaces from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn interfaces(&self) -> DeviceResult<Vec<NetworkInterface>> {
        #[cfg(any(unix, windows))]
        {
            sys::enumerate().map_err(DeviceError::from)
        }

        #[cfg(not(any(unix, windows)))]
        {
            Err(DeviceError::Unsupported(std::env::consts::OS))
        }
    }
}

/// A fixed interface list. Used by the diagnostic tooling and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticInterfaces(pub Vec<NetworkInterface>);

impl InterfaceSource for StaticInterfaces {
    fn interfaces(&self) -> DeviceResult<Vec<NetworkInterface>> {
        Ok(self.0.clone())
    }
}

/// Formats a hardware address as lowercase colon-separated hex.
pub(crate) fn format_mac(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(unix)]
mod sys {
    use super::{format_mac, NetworkInterface};
    use std::ffi::CStr;
    use std::io;
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    /// Walks `getifaddrs`, folding the per-family entries into one record per interface.
    pub(super) fn enumerate() -> io::Result<Vec<NetworkInterface>> {
        let mut head: *mut libc::ifaddrs = std::ptr::null_mut();
        // SAFETY: on success `head` owns a list released by freeifaddrs below.
        if unsafe { libc::getifaddrs(&mut head) } != 0 {
            return Err(io::Error::last_os_error());
        }

        let mut interfaces: Vec<NetworkInterface> = Vec::new();
        let mut cursor = head;
        while !cursor.is_null() {
            // SAFETY: cursor is a live node of the getifaddrs list.
            let entry = unsafe { &*cursor };
            cursor = entry.ifa_next;

            if entry.ifa_name.is_null() {
                continue;
            }
            // SAFETY: ifa_name is a NUL-terminated string owned by the list.
            let name = unsafe { CStr::from_ptr(entry.ifa_name) }
                .to_string_lossy()
                .into_owned();
            let flags = entry.ifa_flags as libc::c_int;

            let slot = match interfaces.iter().position(|i| i.name == name) {
                Some(slot) => slot,
                None => {
                    interfaces.push(NetworkInterface {
                        name,
                        is_up: flags & libc::IFF_UP != 0,
                        is_loopback: flags & libc::IFF_LOOPBACK != 0,
                        mac: None,
                        addresses: Vec::new(),
                    });
                    interfaces.len() - 1
                }
            };

            if !entry.ifa_addr.is_null() {
                // SAFETY: ifa_addr is non-null; its family tags the concrete sockaddr type.
                unsafe { read_address(entry.ifa_addr, &mut interfaces[slot]) };
            }
        }

        // SAFETY: head came from a successful getifaddrs call and is freed once.
        unsafe { libc::freeifaddrs(head) };
        Ok(interfaces)
    }

    /// # Safety
    /// `addr` must point to a valid sockaddr of the family it declares.
    unsafe fn read_address(addr: *const libc::sockaddr, iface: &mut NetworkInterface) {
        let family = unsafe { (*addr).sa_family } as libc::c_int;
        match family {
            libc::AF_INET => {
                let sin = unsafe { &*(addr as *const libc::sockaddr_in) };
                let ip = Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr));
                iface.addresses.push(IpAddr::V4(ip));
            }
            libc::AF_INET6 => {
                let sin6 = unsafe { &*(addr as *const libc::sockaddr_in6) };
                let ip = Ipv6Addr::from(sin6.sin6_addr.s6_addr);
                iface.addresses.push(IpAddr::V6(ip));
            }
            #[cfg(any(target_os = "linux", target_os = "android"))]
            libc::AF_PACKET => {
                let ll = unsafe { &*(addr as *const libc::sockaddr_ll) };
                let len = (ll.sll_halen as usize).min(ll.sll_addr.len());
                if len > 0 {
                    iface.mac = Some(format_mac(&ll.sll_addr[..len]));
                }
            }
            #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
            libc::AF_LINK => {
                let dl = unsafe { &*(addr as *const libc::sockaddr_dl) };
                let name_len = dl.sdl_nlen as usize;
                let addr_len = dl.sdl_alen as usize;
                if addr_len > 0 {
                    // The link-layer address follows the interface name inside sdl_data.
                    let data = dl.sdl_data.as_ptr() as *const u8;
                    let bytes = unsafe { std::slice::from_raw_parts(data.add(name_len), addr_len) };
                    iface.mac = Some(format_mac(bytes));
                }
            }
            _ => {}
        }
    }
}

#[cfg(windows)]
mod sys {
    use super::{format_mac, NetworkInterface};
    use std::io;
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    use windows_sys::Win32::Foundation::{ERROR_BUFFER_OVERFLOW, NO_ERROR};
    use windows_sys::Win32::NetworkManagement::IpHelper::{
        GAA_FLAG_SKIP_ANYCAST, GAA_FLAG_SKIP_DNS_SERVER, GAA_FLAG_SKIP_MULTICAST,
        GetAdaptersAddresses, IP_ADAPTER_ADDRESSES_LH,
    };
    use windows_sys::Win32::NetworkManagement::Ndis::IfOperStatusUp;
    use windows_sys::Win32::Networking::WinSock::{
        AF_INET, AF_INET6, AF_UNSPEC, SOCKADDR, SOCKADDR_IN, SOCKADDR_IN6,
    };

    /// `IF_TYPE_SOFTWARE_LOOPBACK` from ipifcons.h.
    const IF_TYPE_SOFTWARE_LOOPBACK: u32 = 24;
    const INITIAL_BUFFER_BYTES: u32 = 16 * 1024;
    const MAX_ATTEMPTS: usize = 3;

    /// Walks `GetAdaptersAddresses`, one record per adapter.
    pub(super) fn enumerate() -> io::Result<Vec<NetworkInterface>> {
        let flags = GAA_FLAG_SKIP_ANYCAST | GAA_FLAG_SKIP_MULTICAST | GAA_FLAG_SKIP_DNS_SERVER;
        let mut size = INITIAL_BUFFER_BYTES;

        for _ in 0..MAX_ATTEMPTS {
            // u64 backing keeps the adapter structs aligned.
            let mut buffer = vec![0u64; (size as usize).div_ceil(8)];
            let head = buffer.as_mut_ptr().cast::<IP_ADAPTER_ADDRESSES_LH>();
            // SAFETY: `head` points to `size` writable bytes; `size` is updated on overflow.
            let rc = unsafe {
                GetAdaptersAddresses(AF_UNSPEC as u32, flags, std::ptr::null(), head, &mut size)
            };
            match rc {
                NO_ERROR => {
                    // SAFETY: on success the buffer holds a valid adapter list.
                    return Ok(unsafe { collect(head) });
                }
                ERROR_BUFFER_OVERFLOW => continue,
                code => return Err(io::Error::from_raw_os_error(code as i32)),
            }
        }
        Err(io::Error::other("adapter list kept growing"))
    }

    /// # Safety
    /// `head` must be the start of a list filled by `GetAdaptersAddresses`.
    unsafe fn collect(head: *const IP_ADAPTER_ADDRESSES_LH) -> Vec<NetworkInterface> {
        let mut interfaces = Vec::new();
        let mut cursor = head;
        while !cursor.is_null() {
            let adapter = unsafe { &*cursor };
            cursor = adapter.Next;

            let mac_len = (adapter.PhysicalAddressLength as usize).min(adapter.PhysicalAddress.len());
            let mut iface = NetworkInterface {
                name: unsafe { wide_to_string(adapter.FriendlyName) },
                is_up: adapter.OperStatus == IfOperStatusUp,
                is_loopback: adapter.IfType == IF_TYPE_SOFTWARE_LOOPBACK,
                mac: (mac_len > 0).then(|| format_mac(&adapter.PhysicalAddress[..mac_len])),
                addresses: Vec::new(),
            };

            let mut unicast = adapter.FirstUnicastAddress;
            while !unicast.is_null() {
                let entry = unsafe { &*unicast };
                unicast = entry.Next;
                if let Some(ip) = unsafe { read_address(entry.Address.lpSockaddr) } {
                    iface.addresses.push(ip);
                }
            }
            interfaces.push(iface);
        }
        interfaces
    }

    /// # Safety
    /// `addr` is null or points to a sockaddr of the family it declares.
    unsafe fn read_address(addr: *const SOCKADDR) -> Option<IpAddr> {
        if addr.is_null() {
            return None;
        }
        match unsafe { (*addr).sa_family } {
            AF_INET => {
                let sin = unsafe { &*addr.cast::<SOCKADDR_IN>() };
                let raw = unsafe { sin.sin_addr.S_un.S_addr };
                Some(IpAddr::V4(Ipv4Addr::from(u32::from_be(raw))))
            }
            AF_INET6 => {
                let sin6 = unsafe { &*addr.cast::<SOCKADDR_IN6>() };
                let bytes = unsafe { sin6.sin6_addr.u.Byte };
                Some(IpAddr::V6(Ipv6Addr::from(bytes)))
            }
            _ => None,
        }
    }

    /// # Safety
    /// `ptr` is null or a NUL-terminated UTF-16 string.
    unsafe fn wide_to_string(ptr: *const u16) -> String {
        if ptr.is_null() {
            return String::new();
        }
        let mut len = 0;
        while unsafe { *ptr.add(len) } != 0 {
            len += 1;
        }
        let units = unsafe { std::slice::from_raw_parts(ptr, len) };
        String::from_utf16_lossy(units)
    }
}
