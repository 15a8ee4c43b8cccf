//! Netlink attribute (rtattr) decoding.
//!
//! [`AttrTable`] walks a type-length-value list honoring 4-byte alignment and
//! rejects any record whose declared length runs past the buffer. It never
//! returns a partial table: either every record is well formed or the whole
//! message is reported as [`Error::MalformedMessage`].

use std::net::Ipv4Addr;

use winnow::binary::{Endianness, u16 as nla_u16};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::error::{Error, Result};

/// Result type for winnow parsers.
pub type PResult<T> = core::result::Result<T, ErrMode<ContextError>>;

/// Netlink attribute alignment.
pub const NLA_ALIGNTO: usize = 4;

/// Align a length to NLA_ALIGNTO boundary.
#[inline]
pub const fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// Size of the attribute header.
pub const NLA_HDRLEN: usize = 4;

/// Attribute type flags.
pub const NLA_F_NESTED: u16 = 1 << 15;
pub const NLA_F_NET_BYTEORDER: u16 = 1 << 14;
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

/// Netlink attribute header (mirrors struct rtattr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlAttr {
    /// Length including header.
    pub nla_len: u16,
    /// Attribute type.
    pub nla_type: u16,
}

impl NlAttr {
    /// Create a new attribute header.
    pub fn new(attr_type: u16, data_len: usize) -> Self {
        Self {
            nla_len: (NLA_HDRLEN + data_len) as u16,
            nla_type: attr_type,
        }
    }

    /// Convert to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }
}

/// Parse one attribute and its alignment padding, returning (type, payload).
///
/// Fails when the declared length is shorter than the header or longer than
/// the remaining input. Missing padding after the final record is tolerated.
pub fn parse_attr<'a>(input: &mut &'a [u8]) -> PResult<(u16, &'a [u8])> {
    let len = nla_u16(Endianness::Native).parse_next(input)? as usize;
    let attr_type = nla_u16(Endianness::Native).parse_next(input)?;

    if len < NLA_HDRLEN {
        return Err(ErrMode::Cut(ContextError::new()));
    }

    let payload: &[u8] = take(len - NLA_HDRLEN).parse_next(input)?;

    let padding = (nla_align(len) - len).min(input.len());
    let _: &[u8] = take(padding).parse_next(input)?;

    Ok((attr_type & NLA_TYPE_MASK, payload))
}

/// Decoded attribute list of one message (or one nested attribute).
#[derive(Debug, Clone, Default)]
pub struct AttrTable<'a> {
    attrs: Vec<(u16, &'a [u8])>,
}

impl<'a> AttrTable<'a> {
    /// Walk every attribute in `data`.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let mut input = data;
        let mut attrs = Vec::new();

        while input.len() >= NLA_HDRLEN {
            let offset = data.len() - input.len();
            let attr = parse_attr(&mut input).map_err(|_| {
                Error::MalformedMessage(format!(
                    "attribute at offset {} overruns {} byte buffer",
                    offset,
                    data.len()
                ))
            })?;
            attrs.push(attr);
        }

        Ok(Self { attrs })
    }

    /// Skip a fixed family header of `header_len` bytes, then walk the rest.
    pub fn parse_after(payload: &'a [u8], header_len: usize) -> Result<Self> {
        if payload.len() < header_len {
            return Err(Error::MalformedMessage(format!(
                "payload of {} bytes is shorter than its {} byte header",
                payload.len(),
                header_len
            )));
        }
        Self::parse(&payload[nla_align(header_len).min(payload.len())..])
    }

    /// Value of the last attribute with this type.
    pub fn get(&self, attr_type: u16) -> Option<&'a [u8]> {
        self.attrs
            .iter()
            .rev()
            .find(|(t, _)| *t == attr_type)
            .map(|(_, v)| *v)
    }

    /// Decode a nested attribute list, if present.
    pub fn nested(&self, attr_type: u16) -> Result<Option<AttrTable<'a>>> {
        self.get(attr_type).map(AttrTable::parse).transpose()
    }

    /// All attributes in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &'a [u8])> + '_ {
        self.attrs.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

/// Helper functions for extracting typed values from attribute payloads.
pub mod get {
    use super::*;

    fn short(what: &str, need: usize, data: &[u8]) -> Error {
        Error::MalformedMessage(format!(
            "{} attribute needs {} bytes, has {}",
            what,
            need,
            data.len()
        ))
    }

    /// Extract a u8 value.
    pub fn u8(data: &[u8]) -> Result<u8> {
        data.first().copied().ok_or_else(|| short("u8", 1, data))
    }

    /// Extract a u32 value (native endian).
    pub fn u32_ne(data: &[u8]) -> Result<u32> {
        match data {
            [a, b, c, d, ..] => Ok(u32::from_ne_bytes([*a, *b, *c, *d])),
            _ => Err(short("u32", 4, data)),
        }
    }

    /// Extract a null-terminated string.
    pub fn string(data: &[u8]) -> Result<&str> {
        let len = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        std::str::from_utf8(&data[..len])
            .map_err(|e| Error::MalformedMessage(format!("invalid UTF-8: {}", e)))
    }

    /// Interpret a 4-byte payload as an IPv4 address.
    ///
    /// Payloads of any other width (IPv6, MPLS labels) are not an IPv4
    /// address and yield `None`.
    pub fn ipv4(data: &[u8]) -> Option<Ipv4Addr> {
        <[u8; 4]>::try_from(data).ok().map(Ipv4Addr::from)
    }
}
