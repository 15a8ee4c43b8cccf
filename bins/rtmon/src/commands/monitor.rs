//! rtmon monitor - mirror the caches and print every change.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::{Args, ValueEnum};
use rtmirror::output::{DumpParams, Printable, dump};
use rtmirror::{
    Action, Address, CacheManager, CacheState, CacheView, ChangeHandler, Link, Neighbor, ObjectFamily,
    PollOutcome, Route, TunnelFact, TunnelTracker,
};

/// Object families that can be mirrored.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum Family {
    /// Network interfaces.
    Link,
    /// ARP cache entries.
    Neigh,
    /// Interface addresses.
    #[value(alias = "addr")]
    Address,
    /// Routing table entries.
    Route,
    /// All of the above.
    All,
}

impl Family {
    fn expand(self) -> &'static [ObjectFamily] {
        match self {
            Family::Link => &[ObjectFamily::Link],
            Family::Neigh => &[ObjectFamily::Neighbor],
            Family::Address => &[ObjectFamily::Address],
            Family::Route => &[ObjectFamily::Route],
            Family::All => &ObjectFamily::ALL,
        }
    }
}

#[derive(Args)]
pub struct MonitorCmd {
    /// Families to mirror (default: all).
    families: Vec<Family>,

    /// Upper bound on each wait for notifications, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    timeout_ms: u64,

    /// Don't print the objects found by the initial dumps.
    #[arg(long)]
    no_initial: bool,
}

impl Default for MonitorCmd {
    fn default() -> Self {
        Self {
            families: Vec::new(),
            timeout_ms: 1000,
            no_initial: false,
        }
    }
}

impl MonitorCmd {
    fn selected(&self) -> Vec<ObjectFamily> {
        let mut families: Vec<ObjectFamily> = if self.families.is_empty() {
            ObjectFamily::ALL.to_vec()
        } else {
            self.families.iter().flat_map(|f| f.expand()).copied().collect()
        };
        families.sort();
        families.dedup();
        families
    }

    pub async fn run(&self, params: &DumpParams) -> anyhow::Result<()> {
        let params = *params;
        let tracker = TunnelTracker::new(move |fact: TunnelFact| print_record(None, &fact, &params));
        let mut mgr = CacheManager::builder()
            .report_initial_dump(!self.no_initial)
            .build(Printer { params, tracker })?;

        let mut live = 0;
        for family in self.selected() {
            match mgr.add_cache(family).await {
                Ok(()) => live += 1,
                Err(e) if e.is_malformed() && mgr.state(family) == CacheState::Live => {
                    tracing::warn!(%family, error = %e, "cache is live with entries missing");
                    live += 1;
                }
                Err(e) => eprintln!("Error: cannot mirror {} cache: {}", family, e),
            }
        }
        if live == 0 {
            anyhow::bail!("no cache could be populated");
        }

        let stop = Arc::new(AtomicBool::new(false));
        let interrupter = mgr.interrupter();
        {
            let stop = Arc::clone(&stop);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    stop.store(true, Ordering::Relaxed);
                    interrupter.interrupt();
                }
            });
        }

        let timeout = Duration::from_millis(self.timeout_ms);
        while !stop.load(Ordering::Relaxed) {
            match mgr.poll(timeout).await {
                Ok(PollOutcome::Dispatched(n)) => tracing::debug!(n, "applied notifications"),
                Ok(PollOutcome::Timeout) | Ok(PollOutcome::Interrupted) => {}
                Err(e) if e.is_malformed() => {
                    tracing::warn!(error = %e, "skipping malformed notification")
                }
                Err(e) => {
                    tracing::warn!(error = %e, "poll failed");
                    tokio::time::sleep(timeout.min(Duration::from_millis(100))).await;
                }
            }
        }

        mgr.close();
        Ok(())
    }
}

/// Prints every applied change, then hands it to the tunnel tracker.
struct Printer<S> {
    params: DumpParams,
    tracker: TunnelTracker<S>,
}

impl<S: FnMut(TunnelFact)> ChangeHandler for Printer<S> {
    fn on_link(&mut self, action: Action, link: &Link, caches: &CacheView<'_>) {
        print_record(Some(action), link, &self.params);
        self.tracker.on_link(action, link, caches);
    }

    fn on_neighbor(&mut self, action: Action, neighbor: &Neighbor, caches: &CacheView<'_>) {
        print_record(Some(action), neighbor, &self.params);
        self.tracker.on_neighbor(action, neighbor, caches);
    }

    fn on_address(&mut self, action: Action, address: &Address, caches: &CacheView<'_>) {
        print_record(Some(action), address, &self.params);
        self.tracker.on_address(action, address, caches);
    }

    fn on_route(&mut self, action: Action, route: &Route, caches: &CacheView<'_>) {
        print_record(Some(action), route, &self.params);
        self.tracker.on_route(action, route, caches);
    }
}

fn print_record<P: Printable>(action: Option<Action>, object: &P, params: &DumpParams) {
    let mut stdout = io::stdout().lock();
    if let Err(e) = dump(&mut stdout, action, object, params) {
        tracing::warn!(error = %e, "failed to write record");
    }
}
