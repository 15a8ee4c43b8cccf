//! GRE correlation against a real tunnel interface.

use rtmirror::{CacheManager, ObjectFamily, Result, TunnelFact, TunnelTracker};
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::common::TestLink;

#[tokio::test]
async fn test_gre_tunnel_facts() -> Result<()> {
    require_root!();

    let facts = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&facts);
    let mut mgr = CacheManager::builder()
        .build(TunnelTracker::new(move |f| sink.lock().unwrap().push(f)))?;
    for family in ObjectFamily::ALL {
        mgr.add_cache(family).await?;
    }

    let tunnel = match TestLink::gre("rtmg", "127.0.0.1", "127.0.0.2") {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Skipping test: cannot create GRE link: {}", e);
            return Ok(());
        }
    };
    tunnel.up()?;
    tunnel.add_addr("172.31.250.1/30")?;
    tunnel.add_route("172.31.251.0/24")?;

    let name = tunnel.name().to_string();
    let expected = TunnelFact::RouteAdded {
        name: name.clone(),
        destination: Ipv4Addr::new(172, 31, 251, 0),
        prefix_len: 24,
    };

    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline && !facts.lock().unwrap().contains(&expected) {
        mgr.poll(Duration::from_millis(100)).await?;
    }

    let facts = facts.lock().unwrap();
    assert!(facts.contains(&TunnelFact::LinkSeen {
        name: name.clone(),
        local: Ipv4Addr::new(127, 0, 0, 1),
        remote: Ipv4Addr::new(127, 0, 0, 2),
    }));
    assert!(facts.contains(&TunnelFact::AddressAssigned {
        name: name.clone(),
        ip: Ipv4Addr::new(172, 31, 250, 1),
    }));
    assert!(facts.contains(&expected));
    Ok(())
}
