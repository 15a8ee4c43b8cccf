//! Shared utilities.

pub mod ifname;

pub use ifname::{index_to_name, name_or_index};

/// Format a link-layer address as colon-separated hex ("00:11:22:33:44:55").
pub fn format_lladdr(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}
