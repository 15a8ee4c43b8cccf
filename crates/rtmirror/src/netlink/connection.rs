//! Request/response matching and notification delivery over one socket.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;
use zerocopy::{Immutable, IntoBytes};

use super::builder::MessageBuilder;
use super::error::{Error, Result};
use super::message::{
    MessageIter, NLM_F_DUMP, NLM_F_DUMP_INTR, NLM_F_REQUEST, NetlinkMessage, NlMsgType,
    error_code,
};
use super::socket::NetlinkSocket;
use super::transport::Transport;

/// Longest single wait; keeps the deadline arithmetic from overflowing.
const MAX_WAIT: Duration = Duration::from_secs(86_400 * 365);

/// Outcome of waiting for an unsolicited message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A notification (or a stray reply set aside earlier).
    Message(NetlinkMessage),
    /// The wait ran its full timeout without traffic.
    Timeout,
    /// The wait was cut short by a signal or an [`Interrupter`].
    Interrupted,
}

/// Wakes a pending [`Connection::poll_notification`] from another task.
///
/// An interrupt requested while nobody is waiting is remembered and ends the
/// next wait immediately.
#[derive(Debug, Clone, Default)]
pub struct Interrupter {
    notify: Arc<Notify>,
}

impl Interrupter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cut the current (or next) wait short.
    pub fn interrupt(&self) {
        self.notify.notify_one();
    }

    async fn interrupted(&self) {
        self.notify.notified().await
    }
}

/// A netlink connection that frames requests, reassembles multi-part
/// replies and queues notifications that arrive in between.
pub struct Connection<T: Transport = NetlinkSocket> {
    transport: T,
    pending: VecDeque<NetlinkMessage>,
}

impl Connection<NetlinkSocket> {
    /// Open a connection on a fresh NETLINK_ROUTE socket.
    pub fn open() -> Result<Self> {
        Ok(Self::new(NetlinkSocket::new()?))
    }
}

impl<T: Transport> Connection<T> {
    /// Wrap an existing transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            pending: VecDeque::new(),
        }
    }

    /// Get the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Join a multicast group.
    pub fn subscribe(&mut self, group: u32) -> Result<()> {
        self.transport.subscribe(group)
    }

    /// Number of notifications set aside and not yet delivered.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Stamp a request with the next sequence number and our port id, then
    /// transmit it. Returns the sequence number to match the reply against.
    pub async fn send(&self, mut builder: MessageBuilder) -> Result<u32> {
        let seq = self.transport.next_seq();
        builder.set_seq(seq);
        builder.set_pid(self.transport.port_id());

        let msg = builder.finish();
        self.transport.send_raw(&msg).await?;
        tracing::trace!(seq, len = msg.len(), "sent request");
        Ok(seq)
    }

    /// Collect the reply to request `seq`.
    ///
    /// Reads until `NLMSG_DONE` (not returned), an ACK, or a reply without
    /// `NLM_F_MULTI` (returned). Messages belonging to anyone else are queued
    /// for [`poll_notification`](Self::poll_notification).
    pub async fn receive_dump(&mut self, seq: u32) -> Result<Vec<NetlinkMessage>> {
        let pid = self.transport.port_id();
        let mut replies = Vec::new();
        let mut done = false;
        let mut interrupted = false;

        while !done {
            let data = self.transport.recv_raw().await?;

            for result in MessageIter::new(&data) {
                let (header, payload) = result?;

                if done || header.nlmsg_seq != seq || header.nlmsg_pid != pid {
                    if is_notification(header.nlmsg_type) {
                        self.pending.push_back(NetlinkMessage::new(header, payload));
                    }
                    continue;
                }

                if header.nlmsg_flags & NLM_F_DUMP_INTR != 0 {
                    interrupted = true;
                }

                match header.nlmsg_type {
                    NlMsgType::NOOP => {}
                    NlMsgType::ERROR => {
                        let errno = error_code(payload)?;
                        if errno != 0 {
                            return Err(Error::from_errno(errno));
                        }
                        done = true;
                    }
                    NlMsgType::DONE => done = true,
                    NlMsgType::OVERRUN => {
                        return Err(Error::InvalidMessage("kernel reported overrun".into()));
                    }
                    _ => {
                        replies.push(NetlinkMessage::new(header, payload));
                        if !header.is_multi() {
                            done = true;
                        }
                    }
                }
            }
        }

        if interrupted {
            tracing::warn!(seq, "dump was interrupted by a concurrent change; results may be inconsistent");
        }
        tracing::debug!(seq, messages = replies.len(), queued = self.pending.len(), "dump complete");
        Ok(replies)
    }

    /// Send a request and collect its reply.
    pub async fn request(&mut self, builder: MessageBuilder) -> Result<Vec<NetlinkMessage>> {
        let seq = self.send(builder).await?;
        self.receive_dump(seq).await
    }

    /// Dump every object of one kind: `msg_type` is a `RTM_GET*` type and
    /// `header` its family header (only the family field is meaningful).
    pub async fn dump<H: IntoBytes + Immutable>(
        &mut self,
        msg_type: u16,
        header: &H,
    ) -> Result<Vec<NetlinkMessage>> {
        let mut builder = MessageBuilder::new(msg_type, NLM_F_REQUEST | NLM_F_DUMP);
        builder.append(header);
        self.request(builder).await
    }

    /// Wait up to `timeout` for the next unsolicited message.
    ///
    /// Queued messages are returned first. A zero timeout only drains what is
    /// already readable. Datagrams holding nothing but control messages (a
    /// stray DONE or ACK) are consumed and the wait goes on until the same
    /// deadline. `EINTR` and `interrupter` both end the wait with
    /// [`Notification::Interrupted`].
    pub async fn poll_notification(
        &mut self,
        timeout: Duration,
        interrupter: &Interrupter,
    ) -> Result<Notification> {
        if let Some(msg) = self.pending.pop_front() {
            return Ok(Notification::Message(msg));
        }

        let deadline = Instant::now() + timeout.min(MAX_WAIT);
        loop {
            let received = tokio::select! {
                biased;
                _ = interrupter.interrupted() => return Ok(Notification::Interrupted),
                received = self.transport.recv_raw() => received,
                _ = tokio::time::sleep_until(deadline) => return Ok(Notification::Timeout),
            };

            let data = match received {
                Ok(data) => data,
                Err(Error::Io(e)) if e.kind() == io::ErrorKind::Interrupted => {
                    return Ok(Notification::Interrupted);
                }
                Err(e) => return Err(e),
            };

            for result in MessageIter::new(&data) {
                let (header, payload) = result?;
                if is_notification(header.nlmsg_type) {
                    self.pending.push_back(NetlinkMessage::new(header, payload));
                }
            }

            if let Some(msg) = self.pending.pop_front() {
                return Ok(Notification::Message(msg));
            }
            tracing::trace!(bytes = data.len(), "datagram held only control messages");
        }
    }
}

fn is_notification(msg_type: u16) -> bool {
    !matches!(
        msg_type,
        NlMsgType::NOOP | NlMsgType::ERROR | NlMsgType::DONE | NlMsgType::OVERRUN
    )
}
