//! Cache population and live notification tests against the running kernel.

use rtmirror::{
    Action, Address, CacheState, CacheView, ChangeHandler, Link, ObjectFamily, PollOutcome,
    Result,
};
use rtmirror::CacheManager;
use std::time::{Duration, Instant};

use crate::common::TestLink;

/// Records link and address events by name/ifindex.
#[derive(Default)]
struct Recorder {
    links: Vec<(Action, String)>,
    addresses: Vec<(Action, u32)>,
}

impl ChangeHandler for Recorder {
    fn on_link(&mut self, action: Action, link: &Link, _caches: &CacheView<'_>) {
        self.links.push((action, link.name().to_string()));
    }

    fn on_address(&mut self, action: Action, addr: &Address, _caches: &CacheView<'_>) {
        self.addresses.push((action, addr.ifindex()));
    }
}

/// Poll until `done` holds or two seconds pass.
async fn poll_until<H: ChangeHandler>(
    mgr: &mut CacheManager<H>,
    mut done: impl FnMut(&CacheManager<H>) -> bool,
) -> Result<bool> {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if done(mgr) {
            return Ok(true);
        }
        mgr.poll(Duration::from_millis(100)).await?;
    }
    Ok(done(mgr))
}

#[tokio::test]
async fn test_initial_dump_sees_loopback() -> Result<()> {
    require_root!();

    let mut mgr = CacheManager::builder().build(())?;
    for family in ObjectFamily::ALL {
        mgr.add_cache(family).await?;
        assert_eq!(mgr.state(family), CacheState::Live);
    }

    let lo = mgr.links().iter().find(|l| l.name() == "lo");
    assert!(lo.is_some(), "loopback missing from link cache");
    assert!(
        mgr.addresses()
            .iter()
            .any(|a| a.address() == Some("127.0.0.1".parse().unwrap())),
        "127.0.0.1 missing from address cache"
    );

    mgr.close();
    assert!(mgr.is_closed());
    assert!(!mgr.links().is_empty());
    assert!(mgr.poll(Duration::from_millis(10)).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_poll_is_bounded() -> Result<()> {
    require_root!();

    let mut mgr = CacheManager::builder().build(())?;
    mgr.add_cache(ObjectFamily::Link).await?;

    let start = Instant::now();
    let outcome = mgr.poll(Duration::from_millis(50)).await?;
    assert!(matches!(
        outcome,
        PollOutcome::Timeout | PollOutcome::Dispatched(_)
    ));
    assert!(start.elapsed() < Duration::from_secs(2));
    Ok(())
}

#[tokio::test]
async fn test_interrupt_wakes_poll() -> Result<()> {
    require_root!();

    let mut mgr = CacheManager::builder().build(())?;
    mgr.add_cache(ObjectFamily::Link).await?;

    let interrupter = mgr.interrupter();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        interrupter.interrupt();
    });

    let start = Instant::now();
    loop {
        // Unrelated link churn on the host may dispatch first.
        if mgr.poll(Duration::from_secs(10)).await? == PollOutcome::Interrupted {
            break;
        }
    }
    assert!(start.elapsed() < Duration::from_secs(5));
    Ok(())
}

#[tokio::test]
async fn test_link_and_address_notifications() -> Result<()> {
    require_root!();

    let mut mgr = CacheManager::builder().build(Recorder::default())?;
    mgr.add_cache(ObjectFamily::Link).await?;
    mgr.add_cache(ObjectFamily::Address).await?;
    assert!(mgr.handler().links.is_empty());

    let dummy = TestLink::dummy("rtmd")?;
    let name = dummy.name().to_string();
    assert!(
        poll_until(&mut mgr, |m| m.links().iter().any(|l| l.name() == name)).await?,
        "new link never reached the cache"
    );
    assert!(
        mgr.handler()
            .links
            .iter()
            .any(|(a, n)| *a == Action::New && *n == name)
    );

    let ifindex = mgr
        .links()
        .iter()
        .find(|l| l.name() == name)
        .map(|l| l.ifindex())
        .unwrap();
    dummy.add_addr("198.51.100.7/32")?;
    assert!(
        poll_until(&mut mgr, |m| m.addresses().iter().any(|a| a.ifindex() == ifindex)).await?,
        "new address never reached the cache"
    );

    drop(dummy);
    assert!(
        poll_until(&mut mgr, |m| m.links().lookup(&ifindex).is_none()).await?,
        "deleted link still cached"
    );
    assert!(
        mgr.handler()
            .links
            .iter()
            .any(|(a, n)| *a == Action::Del && *n == name)
    );
    Ok(())
}
