//! `ifinfomsg`, IFLA_* ids and the interface flags the mirror reads.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct IfInfoMsg {
    pub ifi_family: u8,
    pub ifi_pad: u8,
    /// `ARPHRD_*`.
    pub ifi_type: u16,
    pub ifi_index: i32,
    /// `IFF_*`.
    pub ifi_flags: u32,
    pub ifi_change: u32,
}

wire_header!(IfInfoMsg);

impl IfInfoMsg {
    pub fn with_family(mut self, family: u8) -> Self {
        self.ifi_family = family;
        self
    }

    pub fn with_index(mut self, index: i32) -> Self {
        self.ifi_index = index;
        self
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.ifi_flags = flags;
        self
    }
}

pub mod attr_ids {
    pub const IFLA_ADDRESS: u16 = 1;
    pub const IFLA_IFNAME: u16 = 3;
    pub const IFLA_MTU: u16 = 4;
    pub const IFLA_OPERSTATE: u16 = 16;
    pub const IFLA_LINKINFO: u16 = 18;

    // inside IFLA_LINKINFO
    pub const IFLA_INFO_KIND: u16 = 1;
    pub const IFLA_INFO_DATA: u16 = 2;

    // inside IFLA_INFO_DATA when the kind is "gre"
    pub const IFLA_GRE_LOCAL: u16 = 6;
    pub const IFLA_GRE_REMOTE: u16 = 7;
}

/// Administratively up.
pub const IFF_UP: u32 = 0x1;
/// Carrier present.
pub const IFF_LOWER_UP: u32 = 0x10000;
