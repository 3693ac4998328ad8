use anyhow::Result;
use bootstrap_tests::*;
use crdb_bootstrap::{BootstrapMode, Error};
use serial_test::serial;
use test_log::test;

#[serial]
#[test(tokio::test)]
async fn outage_aborts_founder() -> Result<()> {
    let mut group = PeerGroup::new(1)?;
    group.env().name_service().set_outage(true);

    let e = group.try_start(0).await.unwrap_err();
    assert!(matches!(e, Error::DiscoveryUnavailable { attempts: 5, .. }));
    assert_ne!(e.exit_code(), 0);

    assert!(group.plan(0).is_none());
    assert!(!group.env().has_sentinel(0)?);
    Ok(())
}

#[serial]
#[test(tokio::test)]
async fn outage_then_recovery() -> Result<()> {
    let mut group = PeerGroup::new(1)?;
    group.env().name_service().set_outage(true);
    assert!(group.try_start(0).await.is_err());

    // The platform restarts the replica from scratch.
    group.env().name_service().set_outage(false);
    assert_eq!(group.start(0).await?, BootstrapMode::Initialize);
    Ok(())
}

#[serial]
#[test(tokio::test)]
async fn flaky_lookups_are_retried() -> Result<()> {
    let mut group = PeerGroup::new(2)?;
    group.env().name_service().fail_next(3);
    assert_eq!(group.start(0).await?, BootstrapMode::Join);
    Ok(())
}

#[serial]
#[test(tokio::test)]
async fn own_name_not_yet_published() -> Result<()> {
    let mut group = PeerGroup::new(1)?;
    group.env().name_service().withdraw(&env::Env::fqdn(0));

    let e = group.try_start(0).await.unwrap_err();
    assert!(matches!(e, Error::DiscoveryUnavailable { .. }));
    Ok(())
}

// Known limitation: a sibling whose record is not published yet is invisible,
// so the founder initializes even though the sibling exists.
#[serial]
#[test(tokio::test)]
async fn unpublished_sibling_is_invisible() -> Result<()> {
    let mut group = PeerGroup::new(2)?;
    group.env().name_service().withdraw(&env::Env::fqdn(1));
    assert_eq!(group.start(0).await?, BootstrapMode::Initialize);
    Ok(())
}
