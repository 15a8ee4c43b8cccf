//! Fixed-size rtnetlink family headers and attribute ids.

/// Shared plumbing for the `#[repr(C)]` headers that prefix each payload.
///
/// `from_bytes` copies out of the buffer, so payloads sliced at arbitrary
/// offsets decode without alignment concerns.
macro_rules! wire_header {
    ($ty:ty) => {
        impl $ty {
            pub const SIZE: usize = size_of::<Self>();

            pub fn new() -> Self {
                Self::default()
            }

            pub fn as_bytes(&self) -> &[u8] {
                zerocopy::IntoBytes::as_bytes(self)
            }

            pub fn from_bytes(data: &[u8]) -> $crate::netlink::error::Result<Self> {
                match <Self as zerocopy::FromBytes>::read_from_prefix(data) {
                    Ok((hdr, _)) => Ok(hdr),
                    Err(_) => Err($crate::netlink::error::Error::Truncated {
                        expected: Self::SIZE,
                        actual: data.len(),
                    }),
                }
            }
        }
    };
}

pub mod addr;
pub mod link;
pub mod neigh;
pub mod route;

pub const AF_INET: u8 = libc::AF_INET as u8;
/// Dump requests use this to mean "every family".
pub const AF_UNSPEC: u8 = libc::AF_UNSPEC as u8;
