#![deny(unused_must_use)]

//! Startup decision for a replica of an ordered replica set:
//! found a brand-new cluster, or join the one that already exists.
//!
//! Only the replica with ordinal 0 may found. It does so only when its
//! durable volume carries no sentinel and no sibling is visible through
//! peer discovery. Every other path joins through the stable group address.

mod error;
pub use error::Error;

/// Command-line and environment configuration.
pub mod config;

/// Ordinal and peer group derived from the assigned network name.
pub mod identity;

/// Durable marker of prior cluster participation.
pub mod sentinel;

/// Name-resolution based discovery of sibling replicas.
pub mod discovery;

/// Founder-or-joiner state machine.
pub mod decision;

/// Command line assembly and hand-over to the database process.
pub mod launcher;

use derive_more::{Deref, Display, FromStr};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub use config::Config;
pub use decision::{BootstrapDecision, BootstrapMode, DecisionEngine, Outcome};
pub use discovery::{Lookup, PeerDiscovery, PeerSet, Resolver, SystemResolver};
pub use identity::{Ordinal, ReplicaIdentity};
pub use launcher::{LaunchMode, LaunchPlan};
pub use sentinel::SentinelStore;

/// Run the whole decision for `config` and produce the command line to launch.
/// With `commit = false` nothing is written to the volume.
pub async fn bootstrap<R: Resolver>(
    config: &Config,
    resolver: R,
    commit: bool,
) -> Result<(Outcome, LaunchPlan), Error> {
    config.validate()?;

    let mut engine = DecisionEngine::new(
        decision::BootstrapInput {
            assigned_name: config.hostname.clone(),
            peer_group: config.peer_group.clone(),
            namespace: config.namespace.clone(),
            join_address: config.join_address(),
        },
        SentinelStore::new(&config.data_dir, &config.sentinel_name),
        PeerDiscovery::new(resolver, config.discovery_policy()),
    );
    let outcome = if commit {
        engine.run().await?
    } else {
        engine.decide().await?
    };

    let plan = LaunchPlan::new(&config.launch_options(), &outcome.identity, &outcome.decision);
    Ok((outcome, plan))
}

/// `bootstrap` on a single-threaded runtime of its own.
///
/// Returns as soon as the decision is made or discovery gives up. Lookups still stuck
/// in `getaddrinfo` on blocking threads are abandoned, not waited for.
pub fn bootstrap_blocking<R: Resolver>(
    config: &Config,
    resolver: R,
    commit: bool,
) -> anyhow::Result<(Outcome, LaunchPlan)> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let res = runtime.block_on(bootstrap(config, resolver, commit));
    runtime.shutdown_background();
    Ok(res?)
}
