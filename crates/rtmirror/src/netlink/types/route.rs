//! `rtmsg`, `rtnexthop` and RTA_* ids.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct RtMsg {
    pub rtm_family: u8,
    pub rtm_dst_len: u8,
    pub rtm_src_len: u8,
    pub rtm_tos: u8,
    /// Only 8 bits wide; RTA_TABLE carries the full id.
    pub rtm_table: u8,
    /// `RTPROT_*`.
    pub rtm_protocol: u8,
    /// `RT_SCOPE_*`.
    pub rtm_scope: u8,
    /// `RTN_*`.
    pub rtm_type: u8,
    /// `RTM_F_*`.
    pub rtm_flags: u32,
}

wire_header!(RtMsg);

impl RtMsg {
    pub fn with_family(mut self, family: u8) -> Self {
        self.rtm_family = family;
        self
    }

    pub fn with_dst_len(mut self, len: u8) -> Self {
        self.rtm_dst_len = len;
        self
    }

    pub fn with_table(mut self, table: u8) -> Self {
        self.rtm_table = table;
        self
    }

    pub fn with_type(mut self, rtm_type: u8) -> Self {
        self.rtm_type = rtm_type;
        self
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.rtm_flags = flags;
        self
    }
}

/// One record inside RTA_MULTIPATH, followed by its own attributes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct RtNexthop {
    /// Record length, trailing attributes included.
    pub rtnh_len: u16,
    pub rtnh_flags: u8,
    /// Weight minus one.
    pub rtnh_hops: u8,
    pub rtnh_ifindex: i32,
}

wire_header!(RtNexthop);

pub mod attr_ids {
    pub const RTA_DST: u16 = 1;
    pub const RTA_SRC: u16 = 2;
    pub const RTA_IIF: u16 = 3;
    pub const RTA_OIF: u16 = 4;
    pub const RTA_GATEWAY: u16 = 5;
    pub const RTA_PRIORITY: u16 = 6;
    pub const RTA_PREFSRC: u16 = 7;
    pub const RTA_MULTIPATH: u16 = 9;
    pub const RTA_TABLE: u16 = 15;
}

/// Main routing table.
pub const RT_TABLE_MAIN: u32 = 254;

/// Report the id of the table the lookup matched in (`rtm_table`/RTA_TABLE)
/// instead of leaving the reply's table as RT_TABLE_MAIN.
pub const RTM_F_LOOKUP_TABLE: u32 = 0x1000;
