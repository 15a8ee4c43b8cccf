//! `ifaddrmsg` and IFA_* ids.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct IfAddrMsg {
    pub ifa_family: u8,
    pub ifa_prefixlen: u8,
    /// `IFA_F_*`; the 32-bit IFA_FLAGS attribute supersedes it.
    pub ifa_flags: u8,
    pub ifa_scope: u8,
    pub ifa_index: u32,
}

wire_header!(IfAddrMsg);

impl IfAddrMsg {
    pub fn with_family(mut self, family: u8) -> Self {
        self.ifa_family = family;
        self
    }

    pub fn with_prefixlen(mut self, len: u8) -> Self {
        self.ifa_prefixlen = len;
        self
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.ifa_index = index;
        self
    }
}

pub mod attr_ids {
    /// Peer address on point-to-point links, otherwise the local one.
    pub const IFA_ADDRESS: u16 = 1;
    pub const IFA_LOCAL: u16 = 2;
    pub const IFA_LABEL: u16 = 3;
}
