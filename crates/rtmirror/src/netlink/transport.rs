//! The socket seam between [`Connection`](super::Connection) and the kernel.

use std::future::Future;

use super::error::Result;

/// A datagram-oriented netlink endpoint.
///
/// [`NetlinkSocket`](super::NetlinkSocket) is the production implementation.
/// Every read returns one whole datagram, which may hold several
/// concatenated netlink messages.
pub trait Transport: Send + Sync {
    /// Port id the kernel assigned to this endpoint.
    fn port_id(&self) -> u32;

    /// Next request sequence number; strictly increasing.
    fn next_seq(&self) -> u32;

    /// Join a multicast group (RTNLGRP_*).
    fn subscribe(&mut self, group: u32) -> Result<()>;

    /// Transmit one framed request.
    fn send_raw(&self, msg: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Wait for the next datagram.
    fn recv_raw(&self) -> impl Future<Output = Result<Vec<u8>>> + Send;
}
