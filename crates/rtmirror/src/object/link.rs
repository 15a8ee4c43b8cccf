//! Network interfaces.

use std::net::Ipv4Addr;

use super::{CacheObject, ObjectFamily};
use crate::netlink::attr::{AttrTable, get};
use crate::netlink::error::{Error, Result};
use crate::netlink::types::link::{IFF_LOWER_UP, IFF_UP, IfInfoMsg, attr_ids::*};

/// Local and remote endpoints of a GRE tunnel.
///
/// A wildcard endpoint (`ip tunnel add ... remote any`) is reported by the
/// kernel as `0.0.0.0`, and so is an endpoint the message omits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct GreEndpoints {
    pub local: Ipv4Addr,
    pub remote: Ipv4Addr,
}

/// A network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct Link {
    pub(crate) ifindex: u32,
    pub(crate) name: String,
    pub(crate) kind: Option<String>,
    pub(crate) gre: Option<GreEndpoints>,
    pub(crate) link_type: u16,
    pub(crate) flags: u32,
    pub(crate) mtu: Option<u32>,
    pub(crate) operstate: Option<u8>,
    pub(crate) address: Option<Vec<u8>>,
}

impl Link {
    /// Interface index.
    pub fn ifindex(&self) -> u32 {
        self.ifindex
    }

    /// Interface name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Link kind from `IFLA_INFO_KIND` ("gre", "veth", ...).
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Tunnel endpoints; only set when the kind is "gre".
    pub fn gre(&self) -> Option<&GreEndpoints> {
        self.gre.as_ref()
    }

    /// Device type (ARPHRD_*).
    pub fn link_type(&self) -> u16 {
        self.link_type
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn is_up(&self) -> bool {
        self.flags & IFF_UP != 0
    }

    pub fn has_carrier(&self) -> bool {
        self.flags & IFF_LOWER_UP != 0
    }

    pub fn mtu(&self) -> Option<u32> {
        self.mtu
    }

    /// RFC 2863 operational state (IF_OPER_*).
    pub fn operstate(&self) -> Option<u8> {
        self.operstate
    }

    /// Hardware address.
    pub fn address(&self) -> Option<&[u8]> {
        self.address.as_deref()
    }
}

impl CacheObject for Link {
    type Key = u32;
    const FAMILY: ObjectFamily = ObjectFamily::Link;

    fn key(&self) -> u32 {
        self.ifindex
    }

    fn from_payload(payload: &[u8]) -> Result<Self> {
        let attrs = AttrTable::parse_after(payload, IfInfoMsg::SIZE)?;
        let header = IfInfoMsg::from_bytes(payload)?;

        if header.ifi_index <= 0 {
            return Err(missing("ifindex"));
        }

        let name = attrs
            .get(IFLA_IFNAME)
            .map(get::string)
            .transpose()?
            .ok_or_else(|| missing("IFLA_IFNAME"))?
            .to_string();

        let mut kind = None;
        let mut gre = None;
        if let Some(info) = attrs.nested(IFLA_LINKINFO)? {
            kind = info
                .get(IFLA_INFO_KIND)
                .map(get::string)
                .transpose()?
                .map(str::to_string);

            if kind.as_deref() == Some("gre") {
                let data = info.nested(IFLA_INFO_DATA)?.unwrap_or_default();
                let endpoint = |t| {
                    data.get(t)
                        .and_then(get::ipv4)
                        .unwrap_or(Ipv4Addr::UNSPECIFIED)
                };
                gre = Some(GreEndpoints {
                    local: endpoint(IFLA_GRE_LOCAL),
                    remote: endpoint(IFLA_GRE_REMOTE),
                });
            }
        }

        Ok(Link {
            ifindex: header.ifi_index as u32,
            name,
            kind,
            gre,
            link_type: header.ifi_type,
            flags: header.ifi_flags,
            mtu: attrs.get(IFLA_MTU).map(get::u32_ne).transpose()?,
            operstate: attrs.get(IFLA_OPERSTATE).map(get::u8).transpose()?,
            address: attrs.get(IFLA_ADDRESS).map(<[u8]>::to_vec),
        })
    }
}

fn missing(attribute: &'static str) -> Error {
    Error::MissingAttribute {
        family: ObjectFamily::Link,
        attribute,
    }
}
