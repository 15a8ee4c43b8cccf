//! Low-level async NETLINK_ROUTE socket.

use std::os::unix::io::AsRawFd;
use std::sync::atomic::{AtomicU32, Ordering};

use bytes::BytesMut;
use netlink_sys::{Socket, SocketAddr, protocols};
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;

use super::error::{Error, Result};
use super::transport::Transport;

/// Default receive buffer; large enough for one kernel dump datagram.
pub const RECV_BUF_SIZE: usize = 32768;

/// Non-blocking NETLINK_ROUTE socket driven by the tokio reactor.
pub struct NetlinkSocket {
    fd: AsyncFd<Socket>,
    seq: AtomicU32,
    /// Port id the kernel assigned at bind time.
    pid: u32,
}

impl NetlinkSocket {
    /// Open and bind a new NETLINK_ROUTE socket.
    pub fn new() -> Result<Self> {
        let mut socket = Socket::new(protocols::NETLINK_ROUTE)?;
        socket.set_non_blocking(true)?;

        // port 0: let the kernel pick
        let mut addr = SocketAddr::new(0, 0);
        socket.bind(&addr)?;
        socket.get_address(&mut addr)?;
        let pid = addr.port_number();

        // Extended ACK gives better error strings; older kernels lack it.
        socket.set_ext_ack(true).ok();

        let fd = AsyncFd::new(socket)?;
        tracing::debug!(pid, "opened rtnetlink socket");

        Ok(Self {
            fd,
            seq: AtomicU32::new(1),
            pid,
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Enlarge the kernel-side receive queue (SO_RCVBUF).
    ///
    /// Busy hosts emit notification bursts that overflow the default queue,
    /// which the kernel reports as ENOBUFS on the next read.
    pub fn set_recv_buffer_size(&self, size: usize) -> Result<()> {
        let size = libc::c_int::try_from(size).unwrap_or(libc::c_int::MAX);
        // SAFETY: the fd is a live socket owned by self, and the option value
        // points to a c_int whose size is passed alongside it.
        let ret = unsafe {
            libc::setsockopt(
                self.fd.as_raw_fd(),
                libc::SOL_SOCKET,
                libc::SO_RCVBUF,
                &size as *const libc::c_int as *const libc::c_void,
                std::mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        if ret < 0 {
            return Err(Error::Io(std::io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl Transport for NetlinkSocket {
    fn port_id(&self) -> u32 {
        self.pid
    }

    fn next_seq(&self) -> u32 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    fn subscribe(&mut self, group: u32) -> Result<()> {
        self.fd.get_mut().add_membership(group)?;
        tracing::debug!(group, "joined multicast group");
        Ok(())
    }

    async fn send_raw(&self, msg: &[u8]) -> Result<()> {
        loop {
            let mut guard = self.fd.ready(Interest::WRITABLE).await?;

            match guard.try_io(|inner| inner.get_ref().send(msg, 0)) {
                Ok(result) => {
                    result?;
                    return Ok(());
                }
                Err(_would_block) => continue,
            }
        }
    }

    async fn recv_raw(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::with_capacity(RECV_BUF_SIZE);

        loop {
            let mut guard = self.fd.ready(Interest::READABLE).await?;

            match guard.try_io(|inner| inner.get_ref().recv(&mut buf, 0)) {
                Ok(result) => {
                    let n = result?;
                    tracing::trace!(bytes = n, "received datagram");
                    return Ok(buf.to_vec());
                }
                Err(_would_block) => continue,
            }
        }
    }
}

/// rtnetlink multicast groups (RTNLGRP_*).
pub mod rtnetlink_groups {
    pub const RTNLGRP_LINK: u32 = 1;
    pub const RTNLGRP_NEIGH: u32 = 3;
    pub const RTNLGRP_IPV4_IFADDR: u32 = 5;
    pub const RTNLGRP_IPV4_ROUTE: u32 = 7;
}
