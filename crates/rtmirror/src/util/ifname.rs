//! Interface index to name resolution via sysfs.

use std::path::Path;

use crate::netlink::error::{Error, Result};

const SYS_CLASS_NET: &str = "/sys/class/net";

/// Convert an interface index to its current name.
pub fn index_to_name(index: u32) -> Result<String> {
    index_to_name_in(Path::new(SYS_CLASS_NET), index)
}

fn index_to_name_in(root: &Path, index: u32) -> Result<String> {
    if index == 0 {
        return Err(Error::InterfaceNotFound { index });
    }

    for entry in std::fs::read_dir(root)?.flatten() {
        let path = entry.path().join("ifindex");
        if let Ok(content) = std::fs::read_to_string(&path)
            && let Ok(idx) = content.trim().parse::<u32>()
            && idx == index
        {
            return Ok(entry.file_name().to_string_lossy().to_string());
        }
    }

    Err(Error::InterfaceNotFound { index })
}

/// Name of the interface, or "if<index>" when it cannot be resolved.
pub fn name_or_index(index: u32) -> String {
    index_to_name(index).unwrap_or_else(|_| format!("if{}", index))
}
