use anyhow::Result;
use bootstrap_tests::*;
use crdb_bootstrap::{BootstrapMode, Error};
use serial_test::serial;
use test_log::test;

#[serial]
#[test(tokio::test)]
async fn unmounted_volume_blocks_launch() -> Result<()> {
    let mut group = PeerGroup::new(1)?;
    group.start(0).await?;

    group.env().add_replica(1)?;
    group.env().unmount_volume(1)?;

    let e = group.try_start(1).await.unwrap_err();
    assert!(matches!(e, Error::SentinelIo { .. }));
    assert_eq!(e.exit_code(), 3);
    assert!(group.plan(1).is_none());
    Ok(())
}

#[serial]
#[test(tokio::test)]
async fn unmounted_founder_volume_blocks_launch() -> Result<()> {
    let mut group = PeerGroup::new(1)?;
    group.env().unmount_volume(0)?;

    let e = group.try_start(0).await.unwrap_err();
    assert!(matches!(e, Error::SentinelIo { .. }));
    assert!(group.plan(0).is_none());
    assert!(group.founders().is_empty());

    // Once the volume is back the replica bootstraps normally.
    std::fs::create_dir(group.env().volume(0)?)?;
    assert_eq!(group.start(0).await?, BootstrapMode::Initialize);
    Ok(())
}
