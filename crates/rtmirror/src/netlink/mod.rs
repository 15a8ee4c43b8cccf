//! Async rtnetlink transport.
//!
//! [`Connection`] owns one socket: it frames requests, reassembles
//! multi-part dump replies, and queues notifications that interleave with
//! them. Attribute decoding ([`attr`]) only ever runs on a complete message.
//!
//! ```ignore
//! use rtmirror::netlink::{Connection, MessageBuilder};
//! use rtmirror::netlink::types::link::IfInfoMsg;
//! use rtmirror::netlink::message::NlMsgType;
//!
//! let mut conn = Connection::open()?;
//! let links = conn.dump(NlMsgType::RTM_GETLINK, &IfInfoMsg::new()).await?;
//! println!("{} links", links.len());
//! ```

pub mod attr;
pub mod builder;
pub mod connection;
pub mod error;
pub mod message;
pub mod socket;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use builder::MessageBuilder;
pub use connection::{Connection, Interrupter, Notification};
pub use error::{Error, Result};
pub use message::NetlinkMessage;
pub use socket::NetlinkSocket;
pub use transport::Transport;
