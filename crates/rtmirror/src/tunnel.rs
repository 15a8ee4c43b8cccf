//! GRE tunnel correlation.
//!
//! Derives tunnel facts from link, address and route events by resolving
//! interface indexes through the link cache. Nothing here holds state: an
//! interface that is not (yet) in the cache simply produces no fact.

use std::fmt;
use std::net::Ipv4Addr;

use crate::cache::{Cache, CacheView, ChangeHandler};
use crate::object::{Action, Address, Link, Route};

/// A tunnel-level observation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
#[cfg_attr(feature = "output", serde(tag = "fact", rename_all = "snake_case"))]
pub enum TunnelFact {
    /// A GRE link exists with these endpoints.
    LinkSeen {
        name: String,
        local: Ipv4Addr,
        remote: Ipv4Addr,
    },
    /// An IPv4 address was assigned to a GRE link.
    AddressAssigned { name: String, ip: Ipv4Addr },
    /// A non-default IPv4 route egresses through a GRE link.
    RouteAdded {
        name: String,
        destination: Ipv4Addr,
        prefix_len: u8,
    },
}

impl TunnelFact {
    /// Name of the tunnel interface the fact is about.
    pub fn name(&self) -> &str {
        match self {
            TunnelFact::LinkSeen { name, .. }
            | TunnelFact::AddressAssigned { name, .. }
            | TunnelFact::RouteAdded { name, .. } => name,
        }
    }
}

impl fmt::Display for TunnelFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TunnelFact::LinkSeen {
                name,
                local,
                remote,
            } => write!(f, "tunnel {} local {} remote {}", name, local, remote),
            TunnelFact::AddressAssigned { name, ip } => {
                write!(f, "tunnel {} address {}", name, ip)
            }
            TunnelFact::RouteAdded {
                name,
                destination,
                prefix_len,
            } => write!(f, "tunnel {} route {}/{}", name, destination, prefix_len),
        }
    }
}

/// Whether a link is a GRE tunnel. Only the link kind counts; names like
/// "gre0" mean nothing on their own.
pub fn is_tunnel(link: &Link) -> bool {
    link.kind() == Some("gre")
}

/// Fact for a link event: NEW or CHANGE of a GRE link.
pub fn link_fact(action: Action, link: &Link) -> Option<TunnelFact> {
    if action == Action::Del || !is_tunnel(link) {
        return None;
    }
    let gre = link.gre()?;
    Some(TunnelFact::LinkSeen {
        name: link.name().to_string(),
        local: gre.local,
        remote: gre.remote,
    })
}

/// Fact for an address event: an IPv4 address on a GRE link.
pub fn address_fact(action: Action, addr: &Address, links: &Cache<Link>) -> Option<TunnelFact> {
    if action == Action::Del {
        return None;
    }
    let ip = addr.address()?;
    let link = links.lookup(&addr.ifindex())?;
    if !is_tunnel(link) {
        return None;
    }
    Some(TunnelFact::AddressAssigned {
        name: link.name().to_string(),
        ip,
    })
}

/// Facts for a route event: one per nexthop that egresses through a GRE
/// link. Default routes (prefix length 0) never qualify.
pub fn route_facts(action: Action, route: &Route, links: &Cache<Link>) -> Vec<TunnelFact> {
    if action == Action::Del || !route.is_ipv4() || route.dst_len() == 0 {
        return Vec::new();
    }
    let Some(destination) = route.destination() else {
        return Vec::new();
    };

    route
        .nexthops()
        .iter()
        .filter_map(|nh| links.lookup(&nh.ifindex))
        .filter(|link| is_tunnel(link))
        .map(|link| TunnelFact::RouteAdded {
            name: link.name().to_string(),
            destination,
            prefix_len: route.dst_len(),
        })
        .collect()
}

/// A [`ChangeHandler`] that correlates every event and passes the resulting
/// facts to `sink`.
pub struct TunnelTracker<S> {
    sink: S,
}

impl<S: FnMut(TunnelFact)> TunnelTracker<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    fn emit(&mut self, fact: TunnelFact) {
        tracing::info!(tunnel = fact.name(), %fact, "tunnel fact");
        (self.sink)(fact);
    }
}

impl<S: FnMut(TunnelFact)> ChangeHandler for TunnelTracker<S> {
    fn on_link(&mut self, action: Action, link: &Link, _caches: &CacheView<'_>) {
        if let Some(fact) = link_fact(action, link) {
            self.emit(fact);
        }
    }

    fn on_address(&mut self, action: Action, addr: &Address, caches: &CacheView<'_>) {
        match address_fact(action, addr, caches.links()) {
            Some(fact) => self.emit(fact),
            None => tracing::trace!(ifindex = addr.ifindex(), "address not on a known tunnel"),
        }
    }

    fn on_route(&mut self, action: Action, route: &Route, caches: &CacheView<'_>) {
        for fact in route_facts(action, route, caches.links()) {
            self.emit(fact);
        }
    }
}
