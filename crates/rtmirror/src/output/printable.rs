//! Printable implementations for the cached objects and tunnel facts.

use std::io::{self, Write};

use super::Printable;
use crate::netlink::types::route::RT_TABLE_MAIN;
use crate::object::{Address, Link, Neighbor, Route};
use crate::tunnel::TunnelFact;
use crate::util::{format_lladdr, name_or_index};

fn operstate_name(state: u8) -> &'static str {
    match state {
        1 => "NOTPRESENT",
        2 => "DOWN",
        3 => "LOWERLAYERDOWN",
        4 => "TESTING",
        5 => "DORMANT",
        6 => "UP",
        _ => "UNKNOWN",
    }
}

fn table_name(table: u32) -> String {
    match table {
        RT_TABLE_MAIN => "main".to_string(),
        255 => "local".to_string(),
        253 => "default".to_string(),
        other => other.to_string(),
    }
}

impl Printable for Link {
    fn kind(&self) -> &'static str {
        "link"
    }

    fn print_line<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write!(
            w,
            "link {}: {} {}",
            self.ifindex,
            self.name,
            if self.is_up() { "UP" } else { "DOWN" }
        )?;
        if let Some(mtu) = self.mtu {
            write!(w, " mtu {}", mtu)?;
        }
        if let Some(ref kind) = self.kind {
            write!(w, " kind {}", kind)?;
        }
        Ok(())
    }

    fn print_details<W: Write>(&self, w: &mut W) -> io::Result<()> {
        if let Some(ref addr) = self.address {
            writeln!(w, "    link/{} {}", self.link_type, format_lladdr(addr))?;
        }
        if let Some(gre) = self.gre {
            writeln!(w, "    gre local {} remote {}", gre.local, gre.remote)?;
        }
        write!(w, "    flags 0x{:x}", self.flags)?;
        if let Some(state) = self.operstate {
            write!(w, " operstate {}", operstate_name(state))?;
        }
        writeln!(w)
    }
}

impl Printable for Address {
    fn kind(&self) -> &'static str {
        "address"
    }

    fn print_line<W: Write>(&self, w: &mut W) -> io::Result<()> {
        match self.address {
            Some(ip) => write!(w, "address {}/{}", ip, self.prefix_len)?,
            None => write!(w, "address (family {})/{}", self.family, self.prefix_len)?,
        }
        write!(w, " dev {}", name_or_index(self.ifindex))
    }

    fn print_details<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write!(w, "    scope {} flags 0x{:x}", self.scope, self.flags)?;
        if let Some(ref label) = self.label {
            write!(w, " label {}", label)?;
        }
        writeln!(w)
    }
}

impl Printable for Neighbor {
    fn kind(&self) -> &'static str {
        "neighbor"
    }

    fn print_line<W: Write>(&self, w: &mut W) -> io::Result<()> {
        match self.destination {
            Some(ip) => write!(w, "neighbor {}", ip)?,
            None => write!(w, "neighbor (family {})", self.family)?,
        }
        write!(w, " dev {}", name_or_index(self.ifindex))?;
        if let Some(ref lladdr) = self.lladdr {
            write!(w, " lladdr {}", format_lladdr(lladdr))?;
        }
        write!(w, " {}", self.state_name())
    }

    fn print_details<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "    state 0x{:x} flags 0x{:x}", self.state, self.flags)
    }
}

impl Printable for Route {
    fn kind(&self) -> &'static str {
        "route"
    }

    fn print_line<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write!(w, "route {}", self.destination_str())?;

        if let [nh] = self.nexthops.as_slice() {
            if let Some(gw) = nh.gateway {
                write!(w, " via {}", gw)?;
            }
            if nh.ifindex != 0 {
                write!(w, " dev {}", name_or_index(nh.ifindex))?;
            }
        }

        write!(w, " table {}", table_name(self.table))?;
        if let Some(src) = self.prefsrc {
            write!(w, " src {}", src)?;
        }
        if let Some(metric) = self.priority {
            write!(w, " metric {}", metric)?;
        }
        Ok(())
    }

    fn print_details<W: Write>(&self, w: &mut W) -> io::Result<()> {
        if self.nexthops.len() > 1 {
            for nh in &self.nexthops {
                write!(w, "    nexthop")?;
                if let Some(gw) = nh.gateway {
                    write!(w, " via {}", gw)?;
                }
                writeln!(w, " dev {} weight {}", name_or_index(nh.ifindex), nh.weight)?;
            }
        }
        writeln!(
            w,
            "    proto {} scope {} type {}",
            self.protocol, self.scope, self.route_type
        )
    }
}

impl Printable for TunnelFact {
    fn kind(&self) -> &'static str {
        "tunnel"
    }

    fn print_line<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write!(w, "{}", self)
    }
}
