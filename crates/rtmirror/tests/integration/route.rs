//! Direct route lookup tests.

use rtmirror::{Result, query_route};
use std::net::Ipv4Addr;

use crate::common::{TestLink, ip};

#[tokio::test]
async fn test_loopback_lookup() -> Result<()> {
    require_root!();

    // 127.0.0.1 resolves through the local table; that reply is skipped.
    match query_route(Ipv4Addr::LOCALHOST).await {
        Ok(info) => assert_eq!(info.ifname.as_deref(), Some("lo")),
        Err(e) => assert!(e.is_not_found(), "unexpected error: {}", e),
    }
    Ok(())
}

#[tokio::test]
async fn test_lookup_through_dummy() -> Result<()> {
    require_root!();

    let dummy = TestLink::dummy("rtmq")?;
    dummy.up()?;
    dummy.add_addr("198.18.7.1/24")?;

    let info = query_route(Ipv4Addr::new(198, 18, 7, 42)).await?;
    // The kernel echoes the queried host back as a /32.
    assert_eq!(info.destination, Some(Ipv4Addr::new(198, 18, 7, 42)));
    assert_eq!(info.prefix_len, 32);
    assert_eq!(info.gateway, None);
    assert_eq!(info.source, Some(Ipv4Addr::new(198, 18, 7, 1)));
    assert_eq!(info.ifname.as_deref(), Some(dummy.name()));
    Ok(())
}

#[test]
fn test_failed_ip_command_is_io_error() {
    let err = ip(&["link", "show", "dev", "rtmq-absent0"]).unwrap_err();
    assert!(matches!(err, rtmirror::Error::Io(_)), "unexpected error: {:?}", err);
    assert!(err.is_transport());
    assert!(err.to_string().contains("ip link show dev rtmq-absent0"));
}
