//! One-shot route lookup (`ip route get`).

use std::fmt;
use std::net::Ipv4Addr;

use crate::netlink::builder::MessageBuilder;
use crate::netlink::connection::Connection;
use crate::netlink::error::{Error, Result};
use crate::netlink::message::{NLM_F_REQUEST, NetlinkMessage, NlMsgType};
use crate::netlink::transport::Transport;
use crate::netlink::types::AF_INET;
use crate::netlink::types::route::{RT_TABLE_MAIN, RTM_F_LOOKUP_TABLE, RtMsg, attr_ids};
use crate::object::{CacheObject, Route};
use crate::util::ifname;

/// Where the kernel would send a packet.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct RouteInfo {
    /// Destination as the kernel echoes it. A plain lookup (no
    /// `RTM_F_FIB_MATCH`) returns the queried host as a /32, so this is
    /// normally the address that was asked about. `None` only for a /0 reply.
    pub destination: Option<Ipv4Addr>,
    pub prefix_len: u8,
    pub gateway: Option<Ipv4Addr>,
    /// Preferred source address.
    pub source: Option<Ipv4Addr>,
    pub ifindex: Option<u32>,
    pub ifname: Option<String>,
}

impl RouteInfo {
    fn from_route(route: &Route) -> Self {
        let first = route.nexthops().first();
        Self {
            destination: route.destination(),
            prefix_len: route.dst_len(),
            gateway: first.and_then(|nh| nh.gateway),
            source: route.prefsrc(),
            ifindex: first.map(|nh| nh.ifindex).filter(|&i| i != 0),
            ifname: None,
        }
    }
}

impl fmt::Display for RouteInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.destination {
            Some(dst) if self.prefix_len > 0 => write!(f, "{}/{}", dst, self.prefix_len)?,
            _ => f.write_str("default")?,
        }
        if let Some(gw) = self.gateway {
            write!(f, " via {}", gw)?;
        }
        match (&self.ifname, self.ifindex) {
            (Some(name), _) => write!(f, " dev {}", name)?,
            (None, Some(index)) => write!(f, " dev if{}", index)?,
            _ => {}
        }
        if let Some(src) = self.source {
            write!(f, " src {}", src)?;
        }
        Ok(())
    }
}

/// Look up the route to `destination` on a short-lived socket of its own.
pub async fn query_route(destination: Ipv4Addr) -> Result<RouteInfo> {
    let mut conn = Connection::open()?;
    query_route_on(&mut conn, destination).await
}

/// Look up the route to `destination` over an existing connection.
pub async fn query_route_on<T: Transport>(
    conn: &mut Connection<T>,
    destination: Ipv4Addr,
) -> Result<RouteInfo> {
    let replies = conn
        .request(route_get_request(destination))
        .await
        .map_err(|e| e.with_context(format!("route lookup {}", destination)))?;

    let mut info = parse_route_reply(&replies)
        .map_err(|e| match e {
            Error::NotFound(_) => Error::NotFound(format!("no main-table route to {}", destination)),
            other => other,
        })?;

    if let Some(index) = info.ifindex {
        info.ifname = ifname::index_to_name(index).ok();
    }
    tracing::debug!(%destination, route = %info, "route lookup");
    Ok(info)
}

/// Build the `RTM_GETROUTE` request for a single IPv4 destination.
pub fn route_get_request(destination: Ipv4Addr) -> MessageBuilder {
    let mut builder = MessageBuilder::new(NlMsgType::RTM_GETROUTE, NLM_F_REQUEST);
    builder.append(
        &RtMsg::new()
            .with_family(AF_INET)
            .with_dst_len(32)
            .with_flags(RTM_F_LOOKUP_TABLE),
    );
    builder.append_attr(attr_ids::RTA_DST, &destination.octets());
    builder
}

/// Decode the first applicable reply: an IPv4 `RTM_NEWROUTE` from the main
/// table. Anything else is skipped as not applicable.
pub fn parse_route_reply(replies: &[NetlinkMessage]) -> Result<RouteInfo> {
    for msg in replies {
        if msg.msg_type() != NlMsgType::RTM_NEWROUTE {
            continue;
        }
        let route = Route::from_payload(msg.payload())?;
        if route.family() != AF_INET || route.table() != RT_TABLE_MAIN {
            tracing::trace!(table = route.table(), family = route.family(), "skipping reply");
            continue;
        }
        return Ok(RouteInfo::from_route(&route));
    }
    Err(Error::NotFound("no applicable route in reply".into()))
}
