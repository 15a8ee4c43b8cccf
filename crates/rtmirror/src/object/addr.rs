//! Interface addresses.

use std::net::Ipv4Addr;

use super::{CacheObject, ObjectFamily};
use crate::netlink::attr::{AttrTable, get};
use crate::netlink::error::{Error, Result};
use crate::netlink::types::AF_INET;
use crate::netlink::types::addr::{IfAddrMsg, attr_ids::*};

/// Identity of an address: owning interface plus raw address bytes.
pub type AddressKey = (u32, Vec<u8>);

/// An address assigned to an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct Address {
    pub(crate) ifindex: u32,
    pub(crate) family: u8,
    pub(crate) prefix_len: u8,
    pub(crate) flags: u8,
    pub(crate) scope: u8,
    #[cfg_attr(feature = "output", serde(skip))]
    pub(crate) raw: Vec<u8>,
    pub(crate) address: Option<Ipv4Addr>,
    pub(crate) label: Option<String>,
}

impl Address {
    /// Owning interface index.
    pub fn ifindex(&self) -> u32 {
        self.ifindex
    }

    pub fn family(&self) -> u8 {
        self.family
    }

    pub fn is_ipv4(&self) -> bool {
        self.family == AF_INET
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn scope(&self) -> u8 {
        self.scope
    }

    /// The local IPv4 address. `None` for every other family.
    pub fn address(&self) -> Option<Ipv4Addr> {
        self.address
    }

    /// `IFA_LABEL` (e.g. "eth0:1").
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl CacheObject for Address {
    type Key = AddressKey;
    const FAMILY: ObjectFamily = ObjectFamily::Address;

    fn key(&self) -> AddressKey {
        (self.ifindex, self.raw.clone())
    }

    fn from_payload(payload: &[u8]) -> Result<Self> {
        let attrs = AttrTable::parse_after(payload, IfAddrMsg::SIZE)?;
        let header = IfAddrMsg::from_bytes(payload)?;

        if header.ifa_index == 0 {
            return Err(Error::MissingAttribute {
                family: ObjectFamily::Address,
                attribute: "ifindex",
            });
        }

        // On point-to-point links IFA_ADDRESS is the peer; IFA_LOCAL is ours.
        let raw = attrs
            .get(IFA_LOCAL)
            .or_else(|| attrs.get(IFA_ADDRESS))
            .unwrap_or_default()
            .to_vec();

        let address = if header.ifa_family == AF_INET {
            get::ipv4(&raw)
        } else {
            None
        };

        Ok(Address {
            ifindex: header.ifa_index,
            family: header.ifa_family,
            prefix_len: header.ifa_prefixlen,
            flags: header.ifa_flags,
            scope: header.ifa_scope,
            raw,
            address,
            label: attrs
                .get(IFA_LABEL)
                .map(get::string)
                .transpose()?
                .map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::fixtures;

    fn loopback_v4() -> Vec<u8> {
        vec![
            // ifaddrmsg: family=AF_INET, prefixlen=8, flags=IFA_F_PERMANENT, scope=RT_SCOPE_HOST, index=1
            0x02, 0x08, 0x80, 0xfe, //
            0x01, 0x00, 0x00, 0x00, //
            // IFA_ADDRESS = 127.0.0.1
            0x08, 0x00, 0x01, 0x00, //
            0x7f, 0x00, 0x00, 0x01, //
            // IFA_LOCAL = 127.0.0.1
            0x08, 0x00, 0x02, 0x00, //
            0x7f, 0x00, 0x00, 0x01, //
            // IFA_LABEL = "lo"
            0x07, 0x00, 0x03, 0x00, //
            b'l', b'o', 0x00, 0x00, //
        ]
    }

    fn loopback_v6() -> Vec<u8> {
        let mut buf = vec![
            // ifaddrmsg: family=AF_INET6, prefixlen=128, flags=IFA_F_PERMANENT, scope=RT_SCOPE_HOST, index=1
            0x0a, 0x80, 0x80, 0xfe, //
            0x01, 0x00, 0x00, 0x00, //
            // IFA_ADDRESS = ::1
            0x14, 0x00, 0x01, 0x00, //
        ];
        buf.extend_from_slice(&[0; 15]);
        buf.push(1);
        buf
    }

    #[test]
    fn test_loopback_v4() {
        let addr = Address::from_payload(&loopback_v4()).unwrap();
        assert_eq!(addr.ifindex(), 1);
        assert!(addr.is_ipv4());
        assert_eq!(addr.prefix_len(), 8);
        assert_eq!(addr.scope(), 254);
        assert_eq!(addr.address(), Some(Ipv4Addr::LOCALHOST));
        assert_eq!(addr.label(), Some("lo"));
        assert_eq!(addr.key(), (1, vec![127, 0, 0, 1]));
    }

    #[test]
    fn test_ipv6_not_interpreted() {
        let addr = Address::from_payload(&loopback_v6()).unwrap();
        assert!(!addr.is_ipv4());
        assert_eq!(addr.address(), None);
        // Still keyed by its bytes so it never collides with another entry.
        assert_eq!(addr.key().1.len(), 16);
    }

    #[test]
    fn test_local_preferred_over_address() {
        let mut payload = fixtures::addr_v4(5, [172, 16, 0, 1], 30);
        // Rewrite IFA_ADDRESS to a peer address; IFA_LOCAL stays 172.16.0.1.
        payload[IfAddrMsg::SIZE + 4..IfAddrMsg::SIZE + 8].copy_from_slice(&[172, 16, 0, 2]);

        let addr = Address::from_payload(&payload).unwrap();
        assert_eq!(addr.address(), Some(Ipv4Addr::new(172, 16, 0, 1)));
    }

    #[test]
    fn test_ifindex_required() {
        let payload = fixtures::addr_v4(0, [10, 0, 0, 1], 24);
        assert!(Address::from_payload(&payload).unwrap_err().is_malformed());
    }
}
