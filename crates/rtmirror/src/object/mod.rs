//! Typed objects built from rtnetlink messages.

mod addr;
mod link;
mod neigh;
mod route;

use std::fmt;
use std::hash::Hash;

pub use addr::{Address, AddressKey};
pub use link::{GreEndpoints, Link};
pub use neigh::{Neighbor, NeighborKey};
pub use route::{Nexthop, Route, RouteKey};

use crate::netlink::error::Result;
use crate::netlink::message::{NetlinkMessage, NlMsgType};
use crate::netlink::socket::rtnetlink_groups::*;
use crate::netlink::types::{AF_INET, AF_UNSPEC};
use crate::netlink::types::{addr::IfAddrMsg, link::IfInfoMsg, neigh::NdMsg, route::RtMsg};

/// The four mirrored object families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
#[cfg_attr(feature = "output", serde(rename_all = "lowercase"))]
pub enum ObjectFamily {
    Link,
    Neighbor,
    Address,
    Route,
}

impl ObjectFamily {
    /// All families, in the order caches are normally populated.
    pub const ALL: [ObjectFamily; 4] = [
        ObjectFamily::Link,
        ObjectFamily::Neighbor,
        ObjectFamily::Address,
        ObjectFamily::Route,
    ];

    /// Size of the fixed family header that precedes the attributes.
    pub const fn header_len(self) -> usize {
        match self {
            ObjectFamily::Link => IfInfoMsg::SIZE,
            ObjectFamily::Neighbor => NdMsg::SIZE,
            ObjectFamily::Address => IfAddrMsg::SIZE,
            ObjectFamily::Route => RtMsg::SIZE,
        }
    }

    /// Multicast groups carrying this family's notifications.
    pub const fn groups(self) -> &'static [u32] {
        match self {
            ObjectFamily::Link => &[RTNLGRP_LINK],
            ObjectFamily::Neighbor => &[RTNLGRP_NEIGH],
            ObjectFamily::Address => &[RTNLGRP_IPV4_IFADDR],
            ObjectFamily::Route => &[RTNLGRP_IPV4_ROUTE],
        }
    }

    /// `RTM_GET*` type used to dump this family.
    pub const fn dump_type(self) -> u16 {
        match self {
            ObjectFamily::Link => NlMsgType::RTM_GETLINK,
            ObjectFamily::Neighbor => NlMsgType::RTM_GETNEIGH,
            ObjectFamily::Address => NlMsgType::RTM_GETADDR,
            ObjectFamily::Route => NlMsgType::RTM_GETROUTE,
        }
    }

    /// Address family sent in the dump request.
    pub const fn dump_af(self) -> u8 {
        match self {
            ObjectFamily::Link => AF_UNSPEC,
            _ => AF_INET,
        }
    }

    /// Map a message type onto its family and the action it announces.
    pub fn classify(msg_type: u16) -> Option<(ObjectFamily, Action)> {
        Some(match msg_type {
            NlMsgType::RTM_NEWLINK => (ObjectFamily::Link, Action::New),
            NlMsgType::RTM_DELLINK => (ObjectFamily::Link, Action::Del),
            NlMsgType::RTM_NEWNEIGH => (ObjectFamily::Neighbor, Action::New),
            NlMsgType::RTM_DELNEIGH => (ObjectFamily::Neighbor, Action::Del),
            NlMsgType::RTM_NEWADDR => (ObjectFamily::Address, Action::New),
            NlMsgType::RTM_DELADDR => (ObjectFamily::Address, Action::Del),
            NlMsgType::RTM_NEWROUTE => (ObjectFamily::Route, Action::New),
            NlMsgType::RTM_DELROUTE => (ObjectFamily::Route, Action::Del),
            _ => return None,
        })
    }
}

impl fmt::Display for ObjectFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ObjectFamily::Link => "link",
            ObjectFamily::Neighbor => "neighbor",
            ObjectFamily::Address => "address",
            ObjectFamily::Route => "route",
        })
    }
}

/// What happened to an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
#[cfg_attr(feature = "output", serde(rename_all = "UPPERCASE"))]
pub enum Action {
    New,
    Del,
    Change,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::New => "NEW",
            Action::Del => "DEL",
            Action::Change => "CHANGE",
        })
    }
}

/// An object that can live in a [`Cache`](crate::cache::Cache).
pub trait CacheObject: Clone + PartialEq + fmt::Debug {
    /// Identity key; two objects with equal keys are the same kernel object.
    type Key: Clone + Eq + Hash + Ord + fmt::Debug;

    /// Family this object belongs to.
    const FAMILY: ObjectFamily;

    /// Identity key of this object.
    fn key(&self) -> Self::Key;

    /// Build the object from a message payload (family header + attributes).
    fn from_payload(payload: &[u8]) -> Result<Self>;
}

/// A decoded object of any family.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Link(Link),
    Neighbor(Neighbor),
    Address(Address),
    Route(Route),
}

impl Object {
    pub fn family(&self) -> ObjectFamily {
        match self {
            Object::Link(_) => ObjectFamily::Link,
            Object::Neighbor(_) => ObjectFamily::Neighbor,
            Object::Address(_) => ObjectFamily::Address,
            Object::Route(_) => ObjectFamily::Route,
        }
    }

    /// Decode a payload of the given family.
    pub fn from_payload(family: ObjectFamily, payload: &[u8]) -> Result<Self> {
        Ok(match family {
            ObjectFamily::Link => Object::Link(Link::from_payload(payload)?),
            ObjectFamily::Neighbor => Object::Neighbor(Neighbor::from_payload(payload)?),
            ObjectFamily::Address => Object::Address(Address::from_payload(payload)?),
            ObjectFamily::Route => Object::Route(Route::from_payload(payload)?),
        })
    }
}

/// Decode a notification into the action it announces and its object.
///
/// Returns `Ok(None)` for message types outside the four families.
pub fn decode(msg: &NetlinkMessage) -> Result<Option<(Action, Object)>> {
    let Some((family, action)) = ObjectFamily::classify(msg.msg_type()) else {
        return Ok(None);
    };
    Ok(Some((action, Object::from_payload(family, msg.payload())?)))
}
