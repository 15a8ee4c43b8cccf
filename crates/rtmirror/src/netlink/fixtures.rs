//! Netlink message fixtures for testing.
//!
//! Payload helpers return the bytes that follow the netlink header (family
//! header plus attributes); [`frame`] wraps a payload into a full message and
//! [`datagram`] concatenates messages the way one kernel read delivers them.

use std::net::Ipv4Addr;

use super::builder::MessageBuilder;
use super::message::{NLM_F_MULTI, NLMSG_HDRLEN, NlMsgHdr, NlMsgType, nlmsg_align};
use super::types::addr::{IfAddrMsg, attr_ids as ifa};
use super::types::link::{IFF_UP, IfInfoMsg, attr_ids as ifla};
use super::types::neigh::{NdMsg, attr_ids as nda};
use super::types::route::{RT_TABLE_MAIN, RtMsg, RtNexthop, attr_ids as rta};
use super::types::AF_INET;

fn payload_of(builder: MessageBuilder) -> Vec<u8> {
    builder.finish()[NLMSG_HDRLEN..].to_vec()
}

/// Wrap `payload` into a framed message.
pub fn frame(msg_type: u16, flags: u16, seq: u32, pid: u32, payload: &[u8]) -> Vec<u8> {
    let mut hdr = NlMsgHdr::new(msg_type, flags);
    hdr.nlmsg_len = (NLMSG_HDRLEN + payload.len()) as u32;
    hdr.nlmsg_seq = seq;
    hdr.nlmsg_pid = pid;
    let mut buf = hdr.as_bytes().to_vec();
    buf.extend_from_slice(payload);
    buf.resize(nlmsg_align(buf.len()), 0);
    buf
}

/// Concatenate framed messages into one datagram.
pub fn datagram(messages: &[Vec<u8>]) -> Vec<u8> {
    messages.concat()
}

/// Dump terminator.
pub fn done(seq: u32, pid: u32) -> Vec<u8> {
    frame(NlMsgType::DONE, NLM_F_MULTI, seq, pid, &0i32.to_ne_bytes())
}

/// `NLMSG_ERROR` reply carrying `errno` (negative, or 0 for an ACK).
pub fn error(seq: u32, pid: u32, errno: i32) -> Vec<u8> {
    let mut payload = errno.to_ne_bytes().to_vec();
    let mut echoed = NlMsgHdr::new(NlMsgType::RTM_GETROUTE, 0);
    echoed.nlmsg_seq = seq;
    echoed.nlmsg_pid = pid;
    payload.extend_from_slice(echoed.as_bytes());
    frame(NlMsgType::ERROR, 0, seq, pid, &payload)
}

/// Link payload with an optional `IFLA_INFO_KIND`.
pub fn link(ifindex: i32, name: &str, kind: Option<&str>) -> Vec<u8> {
    let mut b = MessageBuilder::new(NlMsgType::RTM_NEWLINK, 0);
    b.append(&IfInfoMsg::new().with_index(ifindex).with_flags(IFF_UP));
    b.append_attr_str(ifla::IFLA_IFNAME, name);
    b.append_attr_u32(ifla::IFLA_MTU, 1500);
    if let Some(kind) = kind {
        let info = b.nest_start(ifla::IFLA_LINKINFO);
        b.append_attr_str(ifla::IFLA_INFO_KIND, kind);
        b.nest_end(info);
    }
    payload_of(b)
}

/// GRE link payload with tunnel endpoints in `IFLA_INFO_DATA`.
pub fn gre_link(ifindex: i32, name: &str, local: Ipv4Addr, remote: Ipv4Addr) -> Vec<u8> {
    let mut b = MessageBuilder::new(NlMsgType::RTM_NEWLINK, 0);
    b.append(&IfInfoMsg::new().with_index(ifindex).with_flags(IFF_UP));
    b.append_attr_str(ifla::IFLA_IFNAME, name);
    b.append_attr_u32(ifla::IFLA_MTU, 1476);
    let info = b.nest_start(ifla::IFLA_LINKINFO);
    b.append_attr_str(ifla::IFLA_INFO_KIND, "gre");
    let data = b.nest_start(ifla::IFLA_INFO_DATA);
    b.append_attr(ifla::IFLA_GRE_LOCAL, &local.octets());
    b.append_attr(ifla::IFLA_GRE_REMOTE, &remote.octets());
    b.nest_end(data);
    b.nest_end(info);
    payload_of(b)
}

/// IPv4 address payload.
pub fn addr_v4(ifindex: u32, addr: [u8; 4], prefix_len: u8) -> Vec<u8> {
    let mut b = MessageBuilder::new(NlMsgType::RTM_NEWADDR, 0);
    b.append(
        &IfAddrMsg::new()
            .with_family(AF_INET)
            .with_prefixlen(prefix_len)
            .with_index(ifindex),
    );
    b.append_attr(ifa::IFA_ADDRESS, &addr);
    b.append_attr(ifa::IFA_LOCAL, &addr);
    payload_of(b)
}

/// Main-table IPv4 route payload with an optional single nexthop.
pub fn route_v4(dst: [u8; 4], dst_len: u8, gateway: Option<[u8; 4]>, oif: Option<u32>) -> Vec<u8> {
    let mut b = route_header(dst, dst_len);
    if let Some(gw) = gateway {
        b.append_attr(rta::RTA_GATEWAY, &gw);
    }
    if let Some(oif) = oif {
        b.append_attr_u32(rta::RTA_OIF, oif);
    }
    payload_of(b)
}

/// Main-table IPv4 route payload with an `RTA_MULTIPATH` list.
pub fn multipath_route_v4(dst: [u8; 4], dst_len: u8, hops: &[(u32, Option<[u8; 4]>)]) -> Vec<u8> {
    let mut b = route_header(dst, dst_len);
    b.append_attr(rta::RTA_MULTIPATH, &rtnexthops(hops));
    payload_of(b)
}

/// Encode `rtnexthop` records, each optionally followed by `RTA_GATEWAY`.
pub fn rtnexthops(hops: &[(u32, Option<[u8; 4]>)]) -> Vec<u8> {
    let mut buf = Vec::new();
    for (ifindex, gateway) in hops {
        let gw_len = if gateway.is_some() { 8 } else { 0 };
        let nh = RtNexthop {
            rtnh_len: (RtNexthop::SIZE + gw_len) as u16,
            rtnh_flags: 0,
            rtnh_hops: 0,
            rtnh_ifindex: *ifindex as i32,
        };
        buf.extend_from_slice(nh.as_bytes());
        if let Some(gw) = gateway {
            buf.extend_from_slice(&8u16.to_ne_bytes());
            buf.extend_from_slice(&rta::RTA_GATEWAY.to_ne_bytes());
            buf.extend_from_slice(gw);
        }
    }
    buf
}

fn route_header(dst: [u8; 4], dst_len: u8) -> MessageBuilder {
    let mut b = MessageBuilder::new(NlMsgType::RTM_NEWROUTE, 0);
    b.append(
        &RtMsg::new()
            .with_family(AF_INET)
            .with_dst_len(dst_len)
            .with_table(RT_TABLE_MAIN as u8)
            .with_type(1),
    );
    b.append_attr_u32(rta::RTA_TABLE, RT_TABLE_MAIN);
    if dst_len > 0 {
        b.append_attr(rta::RTA_DST, &dst);
    }
    b
}

/// IPv4 neighbor payload.
pub fn neigh_v4(ifindex: i32, dst: [u8; 4], lladdr: Option<[u8; 6]>, state: u16) -> Vec<u8> {
    let mut b = MessageBuilder::new(NlMsgType::RTM_NEWNEIGH, 0);
    b.append(
        &NdMsg::new()
            .with_family(AF_INET)
            .with_ifindex(ifindex)
            .with_state(state),
    );
    b.append_attr(nda::NDA_DST, &dst);
    if let Some(mac) = lladdr {
        b.append_attr(nda::NDA_LLADDR, &mac);
    }
    payload_of(b)
}

/// Route payload holding only a destination and a gateway.
pub fn route_dst_gateway() -> Vec<u8> {
    vec![
        // rtmsg: family=AF_INET, dst_len=32, src_len=0, tos=0,
        //        table=RT_TABLE_MAIN, protocol=RTPROT_BOOT, scope=RT_SCOPE_UNIVERSE, type=RTN_UNICAST
        0x02, 0x20, 0x00, 0x00, //
        0xfe, 0x03, 0x00, 0x01, //
        0x00, 0x00, 0x00, 0x00, // flags = 0
        // RTA_DST = 10.0.0.2
        0x08, 0x00, // len = 8
        0x01, 0x00, // type = RTA_DST (1)
        0x0a, 0x00, 0x00, 0x02, //
        // RTA_GATEWAY = 10.0.0.1
        0x08, 0x00, // len = 8
        0x05, 0x00, // type = RTA_GATEWAY (5)
        0x0a, 0x00, 0x00, 0x01, //
    ]
}

/// Default route via 192.168.1.1 on ifindex 2.
/// Captured from: ip -4 route show default
pub fn route_default_v4() -> Vec<u8> {
    vec![
        // rtmsg: family=AF_INET, dst_len=0, table=main, protocol=RTPROT_DHCP, scope=universe, type=unicast
        0x02, 0x00, 0x00, 0x00, //
        0xfe, 0x10, 0x00, 0x01, //
        0x00, 0x00, 0x00, 0x00, //
        // RTA_TABLE = 254
        0x08, 0x00, 0x0f, 0x00, //
        0xfe, 0x00, 0x00, 0x00, //
        // RTA_PRIORITY = 100
        0x08, 0x00, 0x06, 0x00, //
        0x64, 0x00, 0x00, 0x00, //
        // RTA_PREFSRC = 192.168.1.50
        0x08, 0x00, 0x07, 0x00, //
        0xc0, 0xa8, 0x01, 0x32, //
        // RTA_GATEWAY = 192.168.1.1
        0x08, 0x00, 0x05, 0x00, //
        0xc0, 0xa8, 0x01, 0x01, //
        // RTA_OIF = 2
        0x08, 0x00, 0x04, 0x00, //
        0x02, 0x00, 0x00, 0x00, //
    ]
}

/// Link message for loopback interface.
/// Captured from: ip link show lo
pub fn link_loopback() -> Vec<u8> {
    vec![
        // ifinfomsg: family=0, pad=0, type=772 (ARPHRD_LOOPBACK), index=1, flags=0x49, change=0
        0x00, 0x00, // family, pad
        0x04, 0x03, // type = 772
        0x01, 0x00, 0x00, 0x00, // index = 1
        0x49, 0x00, 0x00, 0x00, // flags = IFF_UP | IFF_LOOPBACK | IFF_RUNNING
        0x00, 0x00, 0x00, 0x00, // change = 0
        // IFLA_IFNAME = "lo"
        0x07, 0x00, 0x03, 0x00, //
        b'l', b'o', 0x00, 0x00, // "lo\0" + padding
        // IFLA_MTU = 65536
        0x08, 0x00, 0x04, 0x00, //
        0x00, 0x00, 0x01, 0x00, //
        // IFLA_OPERSTATE = 0 (UNKNOWN)
        0x05, 0x00, 0x10, 0x00, //
        0x00, 0x00, 0x00, 0x00, // operstate + padding
    ]
}
