//! Live in-process mirror of the kernel's IPv4 routing state.
//!
//! The crate dumps links, ARP neighbors, addresses and routes over
//! rtnetlink, keeps them in typed per-family caches, and applies the
//! kernel's multicast notifications as they arrive. Every effective change
//! is reported to a [`ChangeHandler`]; [`TunnelTracker`] is a handler that
//! turns the stream into GRE tunnel facts.
//!
//! # Features
//!
//! - `output` - JSON/text rendering of events ([`output::dump`])
//! - `integration` - tests against the real kernel (need root)
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use rtmirror::{CacheManager, ObjectFamily, PollOutcome, TunnelTracker};
//!
//! #[tokio::main]
//! async fn main() -> rtmirror::Result<()> {
//!     let tracker = TunnelTracker::new(|fact| println!("{}", fact));
//!     let mut mgr = CacheManager::builder().build(tracker)?;
//!     for family in ObjectFamily::ALL {
//!         mgr.add_cache(family).await?;
//!     }
//!
//!     loop {
//!         if mgr.poll(Duration::from_secs(1)).await? == PollOutcome::Interrupted {
//!             break;
//!         }
//!     }
//!     mgr.close();
//!     Ok(())
//! }
//! ```
//!
//! # Route lookup
//!
//! ```ignore
//! let info = rtmirror::query_route("8.8.8.8".parse()?).await?;
//! println!("{}", info); // 8.8.8.8/32 via 192.168.1.1 dev eth0 src 192.168.1.50
//! ```

pub mod cache;
pub mod netlink;
pub mod object;
pub mod route_query;
pub mod tunnel;
pub mod util;

#[cfg(feature = "output")]
pub mod output;

pub use cache::{Cache, CacheManager, CacheState, CacheView, ChangeHandler, ManagerBuilder, PollOutcome};
pub use netlink::{Connection, Error, Interrupter, Result};
pub use object::{Action, Address, Link, Neighbor, ObjectFamily, Route};
pub use route_query::{RouteInfo, query_route};
pub use tunnel::{TunnelFact, TunnelTracker};
