//! ARP neighbor header and attribute ids.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// `struct ndmsg`: fixed header of every RTM_*NEIGH message.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NdMsg {
    pub ndm_family: u8,
    pub ndm_pad1: u8,
    pub ndm_pad2: u16,
    pub ndm_ifindex: i32,
    /// `NUD_*` bits, see [`state`].
    pub ndm_state: u16,
    /// `NTF_*` bits.
    pub ndm_flags: u8,
    pub ndm_type: u8,
}

wire_header!(NdMsg);

impl NdMsg {
    pub fn with_family(mut self, family: u8) -> Self {
        self.ndm_family = family;
        self
    }

    pub fn with_ifindex(mut self, ifindex: i32) -> Self {
        self.ndm_ifindex = ifindex;
        self
    }

    pub fn with_state(mut self, state: u16) -> Self {
        self.ndm_state = state;
        self
    }
}

/// Neighbor attribute ids (NDA_*).
pub mod attr_ids {
    pub const NDA_DST: u16 = 1;
    pub const NDA_LLADDR: u16 = 2;
}

/// Neighbor states (NUD_*).
pub mod state {
    pub const NUD_INCOMPLETE: u16 = 0x01;
    pub const NUD_REACHABLE: u16 = 0x02;
    pub const NUD_STALE: u16 = 0x04;
    pub const NUD_DELAY: u16 = 0x08;
    pub const NUD_PROBE: u16 = 0x10;
    pub const NUD_FAILED: u16 = 0x20;
    pub const NUD_NOARP: u16 = 0x40;
    pub const NUD_PERMANENT: u16 = 0x80;
}
