//! ARP neighbor entries.

use std::net::Ipv4Addr;

use super::{CacheObject, ObjectFamily};
use crate::netlink::attr::{AttrTable, get};
use crate::netlink::error::{Error, Result};
use crate::netlink::types::AF_INET;
use crate::netlink::types::neigh::{NdMsg, attr_ids::*, state::*};

/// Identity of a neighbor: interface plus raw destination bytes.
pub type NeighborKey = (u32, Vec<u8>);

/// A neighbor table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct Neighbor {
    pub(crate) ifindex: u32,
    pub(crate) family: u8,
    #[cfg_attr(feature = "output", serde(skip))]
    pub(crate) dst_raw: Vec<u8>,
    pub(crate) destination: Option<Ipv4Addr>,
    pub(crate) lladdr: Option<Vec<u8>>,
    pub(crate) state: u16,
    pub(crate) flags: u8,
}

impl Neighbor {
    pub fn ifindex(&self) -> u32 {
        self.ifindex
    }

    pub fn family(&self) -> u8 {
        self.family
    }

    pub fn destination(&self) -> Option<Ipv4Addr> {
        self.destination
    }

    /// Link-layer address.
    pub fn lladdr(&self) -> Option<&[u8]> {
        self.lladdr.as_deref()
    }

    /// NUD_* state bits.
    pub fn state(&self) -> u16 {
        self.state
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Name of the state, as `ip neigh` prints it.
    pub fn state_name(&self) -> &'static str {
        match self.state {
            NUD_INCOMPLETE => "INCOMPLETE",
            NUD_REACHABLE => "REACHABLE",
            NUD_STALE => "STALE",
            NUD_DELAY => "DELAY",
            NUD_PROBE => "PROBE",
            NUD_FAILED => "FAILED",
            NUD_NOARP => "NOARP",
            NUD_PERMANENT => "PERMANENT",
            _ => "NONE",
        }
    }
}

impl CacheObject for Neighbor {
    type Key = NeighborKey;
    const FAMILY: ObjectFamily = ObjectFamily::Neighbor;

    fn key(&self) -> NeighborKey {
        (self.ifindex, self.dst_raw.clone())
    }

    fn from_payload(payload: &[u8]) -> Result<Self> {
        let attrs = AttrTable::parse_after(payload, NdMsg::SIZE)?;
        let header = NdMsg::from_bytes(payload)?;

        if header.ndm_ifindex <= 0 {
            return Err(Error::MissingAttribute {
                family: ObjectFamily::Neighbor,
                attribute: "ifindex",
            });
        }

        let dst_raw = attrs.get(NDA_DST).unwrap_or_default().to_vec();
        let destination = if header.ndm_family == AF_INET {
            get::ipv4(&dst_raw)
        } else {
            None
        };

        Ok(Neighbor {
            ifindex: header.ndm_ifindex as u32,
            family: header.ndm_family,
            dst_raw,
            destination,
            lladdr: attrs.get(NDA_LLADDR).map(<[u8]>::to_vec),
            state: header.ndm_state,
            flags: header.ndm_flags,
        })
    }
}
