//! Common test utilities for integration tests.
//!
//! Provides `TestLink`, a scratch interface in the current namespace that
//! is removed on drop, and helper macros for conditional test execution.

use rtmirror::Result;
use std::io;
use std::process::Command;
use std::sync::atomic::{AtomicU32, Ordering};

/// Global counter for unique interface names.
static LINK_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Generate a unique interface name (at most 15 bytes).
fn unique_link_name(prefix: &str) -> String {
    let id = LINK_COUNTER.fetch_add(1, Ordering::SeqCst);
    let pid = std::process::id() % 10_000;
    format!("{}{}x{}", prefix, pid, id)
}

/// Run `ip` with the given arguments.
pub fn ip(args: &[&str]) -> Result<()> {
    let output = Command::new("ip")
        .args(args)
        .output()
        .map_err(rtmirror::Error::Io)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(rtmirror::Error::Io(io::Error::other(format!(
            "ip {}: {}",
            args.join(" "),
            stderr.trim_end()
        ))));
    }
    Ok(())
}

/// A scratch interface with automatic cleanup.
pub struct TestLink {
    name: String,
}

impl TestLink {
    /// Create a dummy interface.
    pub fn dummy(prefix: &str) -> Result<Self> {
        let name = unique_link_name(prefix);
        ip(&["link", "add", &name, "type", "dummy"])?;
        Ok(Self { name })
    }

    /// Create a GRE tunnel between two loopback addresses.
    ///
    /// Fails when the `ip_gre` module is unavailable.
    pub fn gre(prefix: &str, local: &str, remote: &str) -> Result<Self> {
        let name = unique_link_name(prefix);
        ip(&[
            "link", "add", &name, "type", "gre", "local", local, "remote", remote,
        ])?;
        Ok(Self { name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn up(&self) -> Result<()> {
        ip(&["link", "set", &self.name, "up"])
    }

    pub fn add_addr(&self, addr: &str) -> Result<()> {
        ip(&["addr", "add", addr, "dev", &self.name])
    }

    pub fn add_route(&self, prefix: &str) -> Result<()> {
        ip(&["route", "add", prefix, "dev", &self.name])
    }
}

impl Drop for TestLink {
    fn drop(&mut self) {
        let _ = Command::new("ip")
            .args(["link", "del", &self.name])
            .status();
    }
}

/// Check if running as root.
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Skip the test if not running as root.
#[macro_export]
macro_rules! require_root {
    () => {
        if !crate::common::is_root() {
            eprintln!("Skipping test: requires root");
            return Ok(());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_link_name() {
        let a = unique_link_name("rtm");
        let b = unique_link_name("rtm");
        assert_ne!(a, b);
        assert!(a.len() <= 15);
    }
}
