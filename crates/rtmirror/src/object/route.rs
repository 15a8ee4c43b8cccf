//! Routes and their nexthops.

use std::net::Ipv4Addr;

use super::{CacheObject, ObjectFamily};
use crate::netlink::attr::{AttrTable, get, nla_align};
use crate::netlink::error::{Error, Result};
use crate::netlink::types::AF_INET;
use crate::netlink::types::route::{RtMsg, RtNexthop, attr_ids::*};

/// One candidate egress for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct Nexthop {
    /// Egress interface index; 0 when the kernel gave none.
    pub ifindex: u32,
    pub gateway: Option<Ipv4Addr>,
    /// Relative weight among multipath nexthops (1 for single-path routes).
    pub weight: u16,
}

/// Identity of a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteKey {
    pub family: u8,
    pub table: u32,
    pub destination: Vec<u8>,
    pub dst_len: u8,
    pub priority: u32,
}

/// A routing table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct Route {
    pub(crate) family: u8,
    pub(crate) dst_len: u8,
    pub(crate) table: u32,
    pub(crate) protocol: u8,
    pub(crate) scope: u8,
    pub(crate) route_type: u8,
    #[cfg_attr(feature = "output", serde(skip))]
    pub(crate) dst_raw: Vec<u8>,
    pub(crate) destination: Option<Ipv4Addr>,
    pub(crate) priority: Option<u32>,
    pub(crate) prefsrc: Option<Ipv4Addr>,
    pub(crate) nexthops: Vec<Nexthop>,
}

impl Route {
    pub fn family(&self) -> u8 {
        self.family
    }

    pub fn is_ipv4(&self) -> bool {
        self.family == AF_INET
    }

    /// Destination prefix length; 0 is the default route.
    pub fn dst_len(&self) -> u8 {
        self.dst_len
    }

    pub fn is_default(&self) -> bool {
        self.dst_len == 0
    }

    /// Destination network (IPv4 only). `None` for the default route.
    pub fn destination(&self) -> Option<Ipv4Addr> {
        self.destination
    }

    /// Routing table id (full 32-bit value from RTA_TABLE when present).
    pub fn table(&self) -> u32 {
        self.table
    }

    /// Routing protocol (RTPROT_*).
    pub fn protocol(&self) -> u8 {
        self.protocol
    }

    pub fn scope(&self) -> u8 {
        self.scope
    }

    /// Route type (RTN_*).
    pub fn route_type(&self) -> u8 {
        self.route_type
    }

    /// Metric.
    pub fn priority(&self) -> Option<u32> {
        self.priority
    }

    /// Preferred source address.
    pub fn prefsrc(&self) -> Option<Ipv4Addr> {
        self.prefsrc
    }

    /// Nexthops in kernel order. Empty for blackhole/unreachable routes.
    pub fn nexthops(&self) -> &[Nexthop] {
        &self.nexthops
    }

    /// "default" or "a.b.c.d/len".
    pub fn destination_str(&self) -> String {
        match self.destination {
            _ if self.is_default() => "default".to_string(),
            Some(dst) => format!("{}/{}", dst, self.dst_len),
            None => format!("?/{}", self.dst_len),
        }
    }
}

impl CacheObject for Route {
    type Key = RouteKey;
    const FAMILY: ObjectFamily = ObjectFamily::Route;

    fn key(&self) -> RouteKey {
        RouteKey {
            family: self.family,
            table: self.table,
            destination: self.dst_raw.clone(),
            dst_len: self.dst_len,
            priority: self.priority.unwrap_or(0),
        }
    }

    fn from_payload(payload: &[u8]) -> Result<Self> {
        let attrs = AttrTable::parse_after(payload, RtMsg::SIZE)?;
        let header = RtMsg::from_bytes(payload)?;
        let ipv4 = header.rtm_family == AF_INET;
        let addr = |t| if ipv4 { attrs.get(t).and_then(get::ipv4) } else { None };

        let dst_raw = attrs.get(RTA_DST).unwrap_or_default().to_vec();

        let nexthops = match attrs.get(RTA_MULTIPATH) {
            Some(data) => parse_multipath(data, ipv4)?,
            None => {
                let oif = attrs.get(RTA_OIF).map(get::u32_ne).transpose()?;
                let gateway = addr(RTA_GATEWAY);
                if oif.is_some() || gateway.is_some() {
                    vec![Nexthop {
                        ifindex: oif.unwrap_or(0),
                        gateway,
                        weight: 1,
                    }]
                } else {
                    Vec::new()
                }
            }
        };

        Ok(Route {
            family: header.rtm_family,
            dst_len: header.rtm_dst_len,
            table: match attrs.get(RTA_TABLE) {
                Some(data) => get::u32_ne(data)?,
                None => u32::from(header.rtm_table),
            },
            protocol: header.rtm_protocol,
            scope: header.rtm_scope,
            route_type: header.rtm_type,
            destination: addr(RTA_DST),
            dst_raw,
            priority: attrs.get(RTA_PRIORITY).map(get::u32_ne).transpose()?,
            prefsrc: addr(RTA_PREFSRC),
            nexthops,
        })
    }
}

/// Walk an RTA_MULTIPATH payload.
///
/// Produces exactly one nexthop per `rtnexthop` record present; a record
/// whose length runs past the payload fails the whole message.
fn parse_multipath(mut data: &[u8], ipv4: bool) -> Result<Vec<Nexthop>> {
    let mut hops = Vec::new();

    while data.len() >= RtNexthop::SIZE {
        let nh = RtNexthop::from_bytes(data)?;
        let len = nh.rtnh_len as usize;
        if len < RtNexthop::SIZE || len > data.len() {
            return Err(Error::MalformedMessage(format!(
                "nexthop {} declares {} bytes, {} remain",
                hops.len(),
                len,
                data.len()
            )));
        }

        let attrs = AttrTable::parse(&data[RtNexthop::SIZE..len])?;
        hops.push(Nexthop {
            ifindex: nh.rtnh_ifindex as u32,
            gateway: if ipv4 {
                attrs.get(RTA_GATEWAY).and_then(get::ipv4)
            } else {
                None
            },
            weight: u16::from(nh.rtnh_hops) + 1,
        });

        data = &data[nla_align(len).min(data.len())..];
    }

    Ok(hops)
}
