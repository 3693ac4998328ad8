use anyhow::Result;
use bootstrap_tests::*;
use crdb_bootstrap::BootstrapMode;
use serial_test::serial;
use test_log::test;

#[serial]
#[test(tokio::test)]
async fn lone_founder_initializes() -> Result<()> {
    let mut group = PeerGroup::new(1)?;
    assert_eq!(group.start(0).await?, BootstrapMode::Initialize);

    assert!(group.join_flag(0).is_none());
    assert!(group.outcome(0).unwrap().decision.seed_addresses.is_empty());
    assert!(group.env().has_sentinel(0)?);
    Ok(())
}

#[serial]
#[test(tokio::test)]
async fn founder_then_joiner() -> Result<()> {
    let mut group = PeerGroup::new(1)?;
    group.start(0).await?;

    group.env().add_replica(1)?;
    assert_eq!(group.start(1).await?, BootstrapMode::Join);
    assert_eq!(group.join_flag(1).as_deref(), Some("cockroachdb-public"));
    assert!(group.env().has_sentinel(1)?);

    assert_eq!(group.founders(), vec![0]);
    Ok(())
}

#[serial]
#[test(tokio::test)]
async fn founder_command_line() -> Result<()> {
    let mut group = PeerGroup::new(1)?;
    group.start(0).await?;

    let plan = group.plan(0).unwrap();
    let host = format!("--host=cockroachdb-0.{PEER_GROUP}.{NAMESPACE}.{DOMAIN_SUFFIX}");
    assert!(plan.args.contains(&host));
    assert!(plan.args.contains(&"--insecure".to_owned()));
    assert!(plan.args.contains(&"--http-host=0.0.0.0".to_owned()));
    assert!(plan.args.contains(&"--cache=25%".to_owned()));
    assert!(plan.args.contains(&"--max-sql-memory=25%".to_owned()));
    Ok(())
}
