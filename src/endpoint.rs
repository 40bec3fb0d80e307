use std::{fmt, net::Ipv4Addr};

/// Opaque identifier of the OS process being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessId(pub u32);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Remote address of the monitored connection.
///
/// The raw value is the IPv4 address in network byte order, read as a
/// native little-endian integer, which is how the OS connection tables
/// report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    raw: u32,
}

impl Endpoint {
    /// `0.0.0.0`, the endpoint of a store that is not tracking anything yet.
    pub const UNSPECIFIED: Self = Self::from_raw(0);

    #[must_use]
    pub const fn from_raw(raw: u32) -> Self { Self { raw } }

    #[must_use]
    pub const fn raw(self) -> u32 { self.raw }

    #[must_use]
    pub fn addr(self) -> Ipv4Addr { Ipv4Addr::from(self.raw.to_le_bytes()) }
}

impl From<Ipv4Addr> for Endpoint {
    fn from(addr: Ipv4Addr) -> Self { Self::from_raw(u32::from_le_bytes(addr.octets())) }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.addr(), f) }
}
