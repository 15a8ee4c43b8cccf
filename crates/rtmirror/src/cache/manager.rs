//! Cache manager: one connection, four caches, one dispatch loop.
//!
//! ```ignore
//! use std::time::Duration;
//! use rtmirror::{CacheManager, ObjectFamily, PollOutcome};
//!
//! let mut mgr = CacheManager::builder().build(MyHandler::default())?;
//! for family in ObjectFamily::ALL {
//!     mgr.add_cache(family).await?;
//! }
//! loop {
//!     match mgr.poll(Duration::from_secs(1)).await? {
//!         PollOutcome::Dispatched(n) => tracing::debug!(n, "applied"),
//!         PollOutcome::Timeout => {}
//!         PollOutcome::Interrupted => break,
//!     }
//! }
//! ```

use std::collections::BTreeSet;
use std::time::Duration;

use super::{Cache, CacheState};
use crate::netlink::connection::{Connection, Interrupter, Notification};
use crate::netlink::error::{Error, Result};
use crate::netlink::message::NetlinkMessage;
use crate::netlink::socket::NetlinkSocket;
use crate::netlink::transport::Transport;
use crate::netlink::types::{addr::IfAddrMsg, link::IfInfoMsg, neigh::NdMsg, route::RtMsg};
use crate::object::{self, Action, Address, CacheObject, Link, Neighbor, Object, ObjectFamily, Route};

/// Receives every change the manager applies.
///
/// Methods run synchronously inside [`CacheManager::poll`] (and inside
/// [`CacheManager::add_cache`] when the initial dump is reported), after the
/// cache has been updated. They must not block. For DEL the object is the
/// entry that was removed.
pub trait ChangeHandler {
    fn on_link(&mut self, _action: Action, _link: &Link, _caches: &CacheView<'_>) {}
    fn on_neighbor(&mut self, _action: Action, _neighbor: &Neighbor, _caches: &CacheView<'_>) {}
    fn on_address(&mut self, _action: Action, _address: &Address, _caches: &CacheView<'_>) {}
    fn on_route(&mut self, _action: Action, _route: &Route, _caches: &CacheView<'_>) {}
}

/// A handler that ignores everything.
impl ChangeHandler for () {}

/// Read-only access to all four caches.
#[derive(Debug, Clone, Copy)]
pub struct CacheView<'a> {
    links: &'a Cache<Link>,
    neighbors: &'a Cache<Neighbor>,
    addresses: &'a Cache<Address>,
    routes: &'a Cache<Route>,
}

impl<'a> CacheView<'a> {
    pub fn links(&self) -> &'a Cache<Link> {
        self.links
    }

    pub fn neighbors(&self) -> &'a Cache<Neighbor> {
        self.neighbors
    }

    pub fn addresses(&self) -> &'a Cache<Address> {
        self.addresses
    }

    pub fn routes(&self) -> &'a Cache<Route> {
        self.routes
    }
}

/// Result of one [`CacheManager::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// This many notifications were consumed (some may have been no-ops).
    Dispatched(usize),
    /// Nothing arrived within the timeout.
    Timeout,
    /// The wait was interrupted; check the stop flag and poll again.
    Interrupted,
}

/// Builder for [`CacheManager`].
#[derive(Debug, Clone, Default)]
#[must_use = "builders do nothing unless built"]
pub struct ManagerBuilder {
    report_initial_dump: bool,
    recv_buffer_size: Option<usize>,
}

impl ManagerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report every object of the initial dump to the handler as NEW.
    pub fn report_initial_dump(mut self, enable: bool) -> Self {
        self.report_initial_dump = enable;
        self
    }

    /// Set SO_RCVBUF on the socket.
    pub fn recv_buffer_size(mut self, bytes: usize) -> Self {
        self.recv_buffer_size = Some(bytes);
        self
    }

    /// Open a NETLINK_ROUTE socket and build the manager around it.
    pub fn build<H: ChangeHandler>(self, handler: H) -> Result<CacheManager<H>> {
        let socket = NetlinkSocket::new()?;
        if let Some(size) = self.recv_buffer_size {
            socket.set_recv_buffer_size(size)?;
        }
        Ok(self.build_with(socket, handler))
    }

    /// Build the manager on a caller-supplied transport.
    pub fn build_with<H: ChangeHandler, T: Transport>(
        self,
        transport: T,
        handler: H,
    ) -> CacheManager<H, T> {
        CacheManager {
            conn: Some(Connection::new(transport)),
            links: Cache::new(),
            neighbors: Cache::new(),
            addresses: Cache::new(),
            routes: Cache::new(),
            states: [CacheState::Uninitialized; 4],
            subscribed: BTreeSet::new(),
            handler,
            interrupter: Interrupter::new(),
            report_initial_dump: self.report_initial_dump,
        }
    }
}

/// Owns the connection and the four caches, and keeps them current.
pub struct CacheManager<H: ChangeHandler, T: Transport = NetlinkSocket> {
    conn: Option<Connection<T>>,
    links: Cache<Link>,
    neighbors: Cache<Neighbor>,
    addresses: Cache<Address>,
    routes: Cache<Route>,
    states: [CacheState; 4],
    subscribed: BTreeSet<u32>,
    handler: H,
    interrupter: Interrupter,
    report_initial_dump: bool,
}

impl CacheManager<()> {
    pub fn builder() -> ManagerBuilder {
        ManagerBuilder::new()
    }
}

impl<H: ChangeHandler, T: Transport> CacheManager<H, T> {
    /// Current state of a family's cache.
    pub fn state(&self, family: ObjectFamily) -> CacheState {
        self.states[slot(family)]
    }

    fn set_state(&mut self, family: ObjectFamily, state: CacheState) {
        tracing::debug!(%family, %state, "cache state");
        self.states[slot(family)] = state;
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    /// Handle that interrupts a pending (or the next) [`poll`](Self::poll).
    pub fn interrupter(&self) -> Interrupter {
        self.interrupter.clone()
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn links(&self) -> &Cache<Link> {
        &self.links
    }

    pub fn neighbors(&self) -> &Cache<Neighbor> {
        &self.neighbors
    }

    pub fn addresses(&self) -> &Cache<Address> {
        &self.addresses
    }

    pub fn routes(&self) -> &Cache<Route> {
        &self.routes
    }

    pub fn view(&self) -> CacheView<'_> {
        CacheView {
            links: &self.links,
            neighbors: &self.neighbors,
            addresses: &self.addresses,
            routes: &self.routes,
        }
    }

    /// Subscribe to `family`'s notifications, dump it, and mark it live.
    ///
    /// On a transport failure the family goes back to `Uninitialized` with an
    /// empty cache; the other families are untouched.
    ///
    /// Dump entries that fail to decode do not stop the others from being
    /// applied. The family still goes live, and the call then returns a
    /// [`Error::MalformedMessage`] naming how many entries were lost and the
    /// first failure.
    pub async fn add_cache(&mut self, family: ObjectFamily) -> Result<()> {
        let conn = self.conn.as_mut().ok_or(Error::Closed)?;
        if self.states[slot(family)] == CacheState::Live {
            return Ok(());
        }

        // Join before dumping so nothing that changes mid-dump is missed.
        for &group in family.groups() {
            if !self.subscribed.contains(&group) {
                conn.subscribe(group)?;
                self.subscribed.insert(group);
            }
        }

        self.set_state(family, CacheState::Populating);

        let conn = self.conn.as_mut().ok_or(Error::Closed)?;
        let replies = match dump_family(conn, family).await {
            Ok(replies) => replies,
            Err(e) => {
                tracing::warn!(%family, error = %e, "initial dump failed");
                self.clear_cache(family);
                self.set_state(family, CacheState::Uninitialized);
                return Err(e.with_context(format!("dumping {} cache", family)));
            }
        };

        let mut populated = 0usize;
        let mut undecodable = 0usize;
        let mut first_error = None;
        for msg in &replies {
            let object = match object::decode(msg) {
                Ok(Some((Action::New, object))) if object.family() == family => object,
                Ok(_) => {
                    tracing::trace!(msg_type = msg.msg_type(), "skipping non-object dump reply");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(%family, error = %e, "undecodable dump entry");
                    undecodable += 1;
                    first_error.get_or_insert(e);
                    continue;
                }
            };
            self.apply(Action::New, object, self.report_initial_dump);
            populated += 1;
        }

        self.set_state(family, CacheState::Live);
        tracing::info!(%family, objects = populated, undecodable, "cache is live");

        match first_error {
            None => Ok(()),
            Some(e) => Err(Error::MalformedMessage(format!(
                "{} dump: {} undecodable entries, first: {}",
                family, undecodable, e
            ))),
        }
    }

    /// Wait up to `timeout` for notifications and apply them.
    ///
    /// Everything already buffered behind the first notification is applied
    /// in the same call. A message that fails to decode stops the call with
    /// its error; earlier messages stay applied and later ones are applied by
    /// the next poll.
    pub async fn poll(&mut self, timeout: Duration) -> Result<PollOutcome> {
        let conn = self.conn.as_mut().ok_or(Error::Closed)?;

        let first = match conn.poll_notification(timeout, &self.interrupter).await? {
            Notification::Message(msg) => msg,
            Notification::Timeout => return Ok(PollOutcome::Timeout),
            Notification::Interrupted => {
                tracing::debug!("poll interrupted");
                return Ok(PollOutcome::Interrupted);
            }
        };

        self.dispatch(&first)?;
        let mut count = 1;

        while let Some(msg) = self.next_buffered().await? {
            self.dispatch(&msg)?;
            count += 1;
        }

        Ok(PollOutcome::Dispatched(count))
    }

    async fn next_buffered(&mut self) -> Result<Option<NetlinkMessage>> {
        let Some(conn) = self.conn.as_mut() else {
            return Ok(None);
        };
        if conn.pending_len() == 0 {
            return Ok(None);
        }
        match conn.poll_notification(Duration::ZERO, &self.interrupter).await? {
            Notification::Message(msg) => Ok(Some(msg)),
            _ => Ok(None),
        }
    }

    /// Release the socket. Caches keep their last contents for reading;
    /// further `poll` and `add_cache` calls fail with [`Error::Closed`].
    pub fn close(&mut self) {
        if self.conn.take().is_some() {
            tracing::debug!("cache manager closed");
        }
        self.subscribed.clear();
        self.states = [CacheState::Closed; 4];
    }

    fn dispatch(&mut self, msg: &NetlinkMessage) -> Result<()> {
        let Some((family, action)) = ObjectFamily::classify(msg.msg_type()) else {
            tracing::trace!(msg_type = msg.msg_type(), "ignoring unrelated message");
            return Ok(());
        };

        if self.state(family) != CacheState::Live {
            tracing::debug!(%family, "dropping notification for cache that is not live");
            return Ok(());
        }

        let object = Object::from_payload(family, msg.payload()).inspect_err(|e| {
            tracing::warn!(%family, %action, error = %e, "failed to decode notification");
        })?;
        self.apply(action, object, true);
        Ok(())
    }

    fn apply(&mut self, action: Action, object: Object, notify: bool) {
        match object {
            Object::Link(link) => {
                if let Some((action, link)) = reconcile(&mut self.links, action, link) {
                    tracing::debug!(%action, ifindex = link.ifindex(), name = link.name(), "link");
                    if notify {
                        let (handler, caches) = self.handler_and_view();
                        handler.on_link(action, &link, &caches);
                    }
                }
            }
            Object::Neighbor(neigh) => {
                if let Some((action, neigh)) = reconcile(&mut self.neighbors, action, neigh) {
                    tracing::debug!(%action, ifindex = neigh.ifindex(), "neighbor");
                    if notify {
                        let (handler, caches) = self.handler_and_view();
                        handler.on_neighbor(action, &neigh, &caches);
                    }
                }
            }
            Object::Address(addr) => {
                if let Some((action, addr)) = reconcile(&mut self.addresses, action, addr) {
                    tracing::debug!(%action, ifindex = addr.ifindex(), "address");
                    if notify {
                        let (handler, caches) = self.handler_and_view();
                        handler.on_address(action, &addr, &caches);
                    }
                }
            }
            Object::Route(route) => {
                if let Some((action, route)) = reconcile(&mut self.routes, action, route) {
                    tracing::debug!(%action, dst = %route.destination_str(), table = route.table(), "route");
                    if notify {
                        let (handler, caches) = self.handler_and_view();
                        handler.on_route(action, &route, &caches);
                    }
                }
            }
        }
    }

    fn handler_and_view(&mut self) -> (&mut H, CacheView<'_>) {
        let view = CacheView {
            links: &self.links,
            neighbors: &self.neighbors,
            addresses: &self.addresses,
            routes: &self.routes,
        };
        (&mut self.handler, view)
    }

    fn clear_cache(&mut self, family: ObjectFamily) {
        match family {
            ObjectFamily::Link => self.links.clear(),
            ObjectFamily::Neighbor => self.neighbors.clear(),
            ObjectFamily::Address => self.addresses.clear(),
            ObjectFamily::Route => self.routes.clear(),
        }
    }
}

fn slot(family: ObjectFamily) -> usize {
    match family {
        ObjectFamily::Link => 0,
        ObjectFamily::Neighbor => 1,
        ObjectFamily::Address => 2,
        ObjectFamily::Route => 3,
    }
}

/// Apply a kernel event and decide what, if anything, to report.
///
/// The kernel announces both creation and modification as NEW, so NEW for a
/// known key is reported as CHANGE, and a resend of an identical object is
/// not reported at all. DEL reports the removed entry, or nothing if the key
/// was unknown.
fn reconcile<O: CacheObject>(cache: &mut Cache<O>, action: Action, object: O) -> Option<(Action, O)> {
    let key = object.key();
    match action {
        Action::Del => {
            let removed = cache.lookup(&key).cloned();
            cache.apply_event(Action::Del, object);
            removed.map(|old| (Action::Del, old))
        }
        Action::New | Action::Change => {
            if cache.lookup(&key) == Some(&object) {
                return None;
            }
            let report = object.clone();
            let applied = cache.apply_event(Action::Change, object);
            Some((applied, report))
        }
    }
}

async fn dump_family<T: Transport>(
    conn: &mut Connection<T>,
    family: ObjectFamily,
) -> Result<Vec<NetlinkMessage>> {
    let (msg_type, af) = (family.dump_type(), family.dump_af());
    match family {
        ObjectFamily::Link => conn.dump(msg_type, &IfInfoMsg::new().with_family(af)).await,
        ObjectFamily::Neighbor => conn.dump(msg_type, &NdMsg::new().with_family(af)).await,
        ObjectFamily::Address => conn.dump(msg_type, &IfAddrMsg::new().with_family(af)).await,
        ObjectFamily::Route => conn.dump(msg_type, &RtMsg::new().with_family(af)).await,
    }
}
