//! Netlink framing: the `nlmsghdr` layout, the message/flag numbers the
//! mirror speaks, and splitting a datagram into messages.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::error::{Error, Result};

/// Every netlink message starts on a 4-byte boundary.
pub const NLMSG_ALIGNTO: usize = 4;

/// Round `len` up to the next message boundary.
#[inline]
pub const fn nlmsg_align(len: usize) -> usize {
    (len + NLMSG_ALIGNTO - 1) & !(NLMSG_ALIGNTO - 1)
}

/// Bytes occupied by [`NlMsgHdr`] on the wire.
pub const NLMSG_HDRLEN: usize = nlmsg_align(size_of::<NlMsgHdr>());

/// `struct nlmsghdr`, in host byte order.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlMsgHdr {
    /// Total length, header included, excluding trailing padding.
    pub nlmsg_len: u32,
    pub nlmsg_type: u16,
    pub nlmsg_flags: u16,
    pub nlmsg_seq: u32,
    /// Sender port id; 0 for the kernel.
    pub nlmsg_pid: u32,
}

impl NlMsgHdr {
    /// Header for a message with no payload yet.
    pub fn new(msg_type: u16, flags: u16) -> Self {
        Self {
            nlmsg_len: NLMSG_HDRLEN as u32,
            nlmsg_type: msg_type,
            nlmsg_flags: flags,
            ..Self::default()
        }
    }

    /// More parts of the same reply follow.
    pub fn is_multi(&self) -> bool {
        self.nlmsg_flags & NLM_F_MULTI != 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        IntoBytes::as_bytes(self)
    }

    /// View the header at the front of `data`.
    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        match Self::ref_from_prefix(data) {
            Ok((hdr, _rest)) => Ok(hdr),
            Err(_) => Err(Error::Truncated {
                expected: size_of::<Self>(),
                actual: data.len(),
            }),
        }
    }
}

/// Control and rtnetlink message types.
pub struct NlMsgType;

impl NlMsgType {
    pub const NOOP: u16 = 1;
    /// Error report; errno 0 is a plain ACK.
    pub const ERROR: u16 = 2;
    /// Terminates a multi-part dump.
    pub const DONE: u16 = 3;
    pub const OVERRUN: u16 = 4;

    pub const RTM_NEWLINK: u16 = 16;
    pub const RTM_DELLINK: u16 = 17;
    pub const RTM_GETLINK: u16 = 18;

    pub const RTM_NEWADDR: u16 = 20;
    pub const RTM_DELADDR: u16 = 21;
    pub const RTM_GETADDR: u16 = 22;

    pub const RTM_NEWROUTE: u16 = 24;
    pub const RTM_DELROUTE: u16 = 25;
    pub const RTM_GETROUTE: u16 = 26;

    pub const RTM_NEWNEIGH: u16 = 28;
    pub const RTM_DELNEIGH: u16 = 29;
    pub const RTM_GETNEIGH: u16 = 30;
}

pub const NLM_F_REQUEST: u16 = 0x01;
pub const NLM_F_MULTI: u16 = 0x02;
/// The dump was disturbed by a concurrent change and may be inconsistent.
pub const NLM_F_DUMP_INTR: u16 = 0x10;
/// `NLM_F_ROOT | NLM_F_MATCH`: return every object of the family.
pub const NLM_F_DUMP: u16 = 0x300;

/// Splits one received datagram into `(header, payload)` pairs.
///
/// A header whose declared length is shorter than the header itself or runs
/// past the end of the datagram yields a single `InvalidMessage` error, after
/// which the iterator is exhausted. Trailing bytes too short to hold a
/// header are ignored.
pub struct MessageIter<'a> {
    rest: &'a [u8],
}

impl<'a> MessageIter<'a> {
    pub fn new(datagram: &'a [u8]) -> Self {
        Self { rest: datagram }
    }

    fn fail(&mut self, err: Error) -> Option<Result<(&'a NlMsgHdr, &'a [u8])>> {
        self.rest = &[];
        Some(Err(err))
    }
}

impl<'a> Iterator for MessageIter<'a> {
    type Item = Result<(&'a NlMsgHdr, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.len() < NLMSG_HDRLEN {
            return None;
        }

        let hdr = match NlMsgHdr::from_bytes(self.rest) {
            Ok(hdr) => hdr,
            Err(e) => return self.fail(e),
        };

        let len = hdr.nlmsg_len as usize;
        if !(NLMSG_HDRLEN..=self.rest.len()).contains(&len) {
            let avail = self.rest.len();
            return self.fail(Error::InvalidMessage(format!(
                "declared length {len} outside {NLMSG_HDRLEN}..={avail}"
            )));
        }

        let payload = &self.rest[NLMSG_HDRLEN..len];
        self.rest = self.rest.get(nlmsg_align(len)..).unwrap_or_default();
        Some(Ok((hdr, payload)))
    }
}

/// Errno carried by an `NLMSG_ERROR` payload (negative, or 0 for an ACK).
///
/// Only the leading `i32` is read: with `NETLINK_CAP_ACK` the echoed request
/// that follows it may be truncated.
pub fn error_code(payload: &[u8]) -> Result<i32> {
    match payload.first_chunk::<4>() {
        Some(raw) => Ok(i32::from_ne_bytes(*raw)),
        None => Err(Error::Truncated {
            expected: 4,
            actual: payload.len(),
        }),
    }
}

/// An owned message: header plus exactly its declared payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetlinkMessage {
    pub header: NlMsgHdr,
    pub payload: Vec<u8>,
}

impl NetlinkMessage {
    pub(crate) fn new(header: &NlMsgHdr, payload: &[u8]) -> Self {
        Self {
            header: *header,
            payload: payload.to_vec(),
        }
    }

    /// `RTM_*` or control type.
    pub fn msg_type(&self) -> u16 {
        self.header.nlmsg_type
    }

    pub fn seq(&self) -> u32 {
        self.header.nlmsg_seq
    }

    /// Sending port id (0 for kernel-originated notifications).
    pub fn pid(&self) -> u32 {
        self.header.nlmsg_pid
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}
