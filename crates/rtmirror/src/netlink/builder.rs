//! Request construction.
//!
//! The header is kept as a struct until [`MessageBuilder::finish`]; the body
//! (family header followed by attributes) grows in place, padded to 4 bytes
//! after every piece.

use zerocopy::{Immutable, IntoBytes};

use super::attr::{NLA_F_NESTED, NLA_HDRLEN, NlAttr, nla_align};
use super::message::{NLMSG_HDRLEN, NlMsgHdr};

/// Open nested attribute; close it with [`MessageBuilder::nest_end`].
#[derive(Debug, Clone, Copy)]
#[must_use = "an open nest must be closed with nest_end"]
pub struct NestToken {
    start: usize,
}

/// Builds one netlink request.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    header: NlMsgHdr,
    body: Vec<u8>,
}

impl MessageBuilder {
    pub fn new(msg_type: u16, flags: u16) -> Self {
        Self {
            header: NlMsgHdr::new(msg_type, flags),
            body: Vec::new(),
        }
    }

    /// Message type this builder will emit.
    pub fn msg_type(&self) -> u16 {
        self.header.nlmsg_type
    }

    fn pad(&mut self) {
        self.body.resize(nla_align(self.body.len()), 0);
    }

    /// Append a fixed-size family header (`rtmsg`, `ifinfomsg`, ...).
    pub fn append<T: IntoBytes + Immutable>(&mut self, data: &T) {
        self.body.extend_from_slice(data.as_bytes());
        self.pad();
    }

    pub fn append_attr(&mut self, attr_type: u16, data: &[u8]) {
        self.body
            .extend_from_slice(NlAttr::new(attr_type, data.len()).as_bytes());
        self.body.extend_from_slice(data);
        self.pad();
    }

    pub fn append_attr_u32(&mut self, attr_type: u16, value: u32) {
        self.append_attr(attr_type, &value.to_ne_bytes());
    }

    /// NUL-terminated string attribute.
    pub fn append_attr_str(&mut self, attr_type: u16, value: &str) {
        let mut data = Vec::with_capacity(value.len() + 1);
        data.extend_from_slice(value.as_bytes());
        data.push(0);
        self.append_attr(attr_type, &data);
    }

    pub fn nest_start(&mut self, attr_type: u16) -> NestToken {
        let start = self.body.len();
        self.body
            .extend_from_slice(NlAttr::new(attr_type | NLA_F_NESTED, 0).as_bytes());
        NestToken { start }
    }

    /// Patch the nest's length to cover everything appended since
    /// [`nest_start`](Self::nest_start).
    pub fn nest_end(&mut self, token: NestToken) {
        let len = (self.body.len() - token.start).max(NLA_HDRLEN) as u16;
        self.body[token.start..token.start + 2].copy_from_slice(&len.to_ne_bytes());
        self.pad();
    }

    pub fn set_seq(&mut self, seq: u32) {
        self.header.nlmsg_seq = seq;
    }

    pub fn set_pid(&mut self, pid: u32) {
        self.header.nlmsg_pid = pid;
    }

    /// Serialize header and body, filling in `nlmsg_len`.
    pub fn finish(mut self) -> Vec<u8> {
        self.header.nlmsg_len = (NLMSG_HDRLEN + self.body.len()) as u32;
        let mut msg = Vec::with_capacity(NLMSG_HDRLEN + self.body.len());
        msg.extend_from_slice(self.header.as_bytes());
        msg.resize(NLMSG_HDRLEN, 0);
        msg.append(&mut self.body);
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::attr::{AttrTable, get};
    use crate::netlink::message::{NLM_F_DUMP, NLM_F_REQUEST, NlMsgType};
    use crate::netlink::types::route::RtMsg;

    #[test]
    fn test_header_only() {
        let msg = MessageBuilder::new(NlMsgType::RTM_GETLINK, NLM_F_REQUEST | NLM_F_DUMP).finish();
        assert_eq!(msg.len(), NLMSG_HDRLEN);

        let header = NlMsgHdr::from_bytes(&msg).unwrap();
        assert_eq!(header.nlmsg_len as usize, NLMSG_HDRLEN);
        assert_eq!(header.nlmsg_type, NlMsgType::RTM_GETLINK);
        assert_eq!(header.nlmsg_flags, NLM_F_REQUEST | NLM_F_DUMP);
    }

    #[test]
    fn test_seq_and_pid_stamped() {
        let mut builder = MessageBuilder::new(NlMsgType::RTM_GETROUTE, NLM_F_REQUEST);
        builder.set_seq(42);
        builder.set_pid(1234);
        assert_eq!(builder.msg_type(), NlMsgType::RTM_GETROUTE);

        let header = *NlMsgHdr::from_bytes(&builder.finish()).unwrap();
        assert_eq!((header.nlmsg_seq, header.nlmsg_pid), (42, 1234));
    }

    #[test]
    fn test_family_header_then_attribute() {
        let mut builder = MessageBuilder::new(NlMsgType::RTM_GETROUTE, NLM_F_REQUEST);
        builder.append(&RtMsg::new().with_family(2).with_dst_len(32));
        builder.append_attr(1, &[10, 0, 0, 2]);
        let msg = builder.finish();

        assert_eq!(msg.len(), NLMSG_HDRLEN + RtMsg::SIZE + NLA_HDRLEN + 4);
        let table = AttrTable::parse_after(&msg[NLMSG_HDRLEN..], RtMsg::SIZE).unwrap();
        assert_eq!(table.get(1), Some(&[10, 0, 0, 2][..]));
    }

    #[test]
    fn test_string_is_padded() {
        let mut builder = MessageBuilder::new(NlMsgType::RTM_NEWLINK, 0);
        builder.append_attr_str(3, "eth0");
        let msg = builder.finish();

        // 4 header + "eth0\0" = 9, padded to 12
        assert_eq!(msg.len(), NLMSG_HDRLEN + 12);
        let table = AttrTable::parse(&msg[NLMSG_HDRLEN..]).unwrap();
        assert_eq!(get::string(table.get(3).unwrap()).unwrap(), "eth0");
    }

    #[test]
    fn test_nested_attribute() {
        let mut builder = MessageBuilder::new(NlMsgType::RTM_NEWLINK, 0);
        let nest = builder.nest_start(18);
        builder.append_attr_str(1, "gre");
        builder.append_attr_u32(2, 7);
        builder.nest_end(nest);
        let msg = builder.finish();

        let table = AttrTable::parse(&msg[NLMSG_HDRLEN..]).unwrap();
        let info = table.nested(18).unwrap().unwrap();
        assert_eq!(get::string(info.get(1).unwrap()).unwrap(), "gre");
        assert_eq!(get::u32_ne(info.get(2).unwrap()).unwrap(), 7);
    }
}
