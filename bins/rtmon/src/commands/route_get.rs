//! rtmon route-get - one-shot route lookup.

use std::io::Write;
use std::net::Ipv4Addr;

use anyhow::Context;
use clap::Args;
use rtmirror::output::DumpParams;

#[derive(Args)]
pub struct RouteGetCmd {
    /// IPv4 destination to look up.
    address: Ipv4Addr,
}

impl RouteGetCmd {
    pub async fn run(&self, params: &DumpParams) -> anyhow::Result<()> {
        let info = rtmirror::query_route(self.address)
            .await
            .with_context(|| format!("no route to {}", self.address))?;

        let mut stdout = std::io::stdout().lock();
        if params.json {
            serde_json::to_writer(&mut stdout, &info)?;
            writeln!(stdout)?;
        } else {
            writeln!(stdout, "{} {}", self.address, info)?;
        }
        Ok(())
    }
}
