use anyhow::{ensure, Result};
use crdb_bootstrap::{BootstrapMode, Error, LaunchPlan, Outcome};
use env::Env;
use std::collections::BTreeMap;

pub use env::{DOMAIN_SUFFIX, NAMESPACE, PEER_GROUP};

pub struct Builder {
    with_logging: bool,
}
impl Builder {
    fn new() -> Self {
        Self { with_logging: true }
    }

    pub fn with_logging(self, b: bool) -> Self {
        Self {
            with_logging: b,
            ..self
        }
    }

    /// Schedule `n` replicas without starting them.
    pub fn build(self, n: u32) -> Result<PeerGroup> {
        ensure!(n > 0);
        let mut env = Env::new(self.with_logging);
        for ordinal in 0..n {
            env.add_replica(ordinal)?;
        }
        Ok(PeerGroup {
            env,
            launched: BTreeMap::new(),
        })
    }
}

/// A replica set whose replicas are bootstrapped one by one.
pub struct PeerGroup {
    env: Env,
    /// Last launch of each replica.
    launched: BTreeMap<u32, (Outcome, LaunchPlan)>,
}
impl PeerGroup {
    pub fn builder() -> Builder {
        Builder::new()
    }

    pub fn new(n: u32) -> Result<Self> {
        Self::builder().build(n)
    }

    pub fn env(&mut self) -> &mut Env {
        &mut self.env
    }

    /// Bootstrap replica `ordinal` and record what it would launch.
    pub async fn start(&mut self, ordinal: u32) -> Result<BootstrapMode> {
        let (outcome, plan) = self.env.bootstrap(ordinal).await?;
        let mode = outcome.decision.mode;
        self.launched.insert(ordinal, (outcome, plan));
        Ok(mode)
    }

    /// Like `start` but keeps the typed error to check which failure occurred.
    pub async fn try_start(&mut self, ordinal: u32) -> std::result::Result<BootstrapMode, Error> {
        match self.start(ordinal).await {
            Ok(mode) => Ok(mode),
            Err(e) => match e.downcast::<Error>() {
                Ok(e) => Err(e),
                Err(e) => panic!("unexpected error: {e:#}"),
            },
        }
    }

    pub fn plan(&self, ordinal: u32) -> Option<&LaunchPlan> {
        self.launched.get(&ordinal).map(|(_, plan)| plan)
    }

    pub fn outcome(&self, ordinal: u32) -> Option<&Outcome> {
        self.launched.get(&ordinal).map(|(outcome, _)| outcome)
    }

    /// Replicas whose latest start founded a cluster.
    pub fn founders(&self) -> Vec<u32> {
        self.launched
            .iter()
            .filter(|(_, (outcome, _))| outcome.decision.mode == BootstrapMode::Initialize)
            .map(|(ordinal, _)| *ordinal)
            .collect()
    }

    pub fn join_flag(&self, ordinal: u32) -> Option<String> {
        self.plan(ordinal)?
            .args
            .iter()
            .find_map(|a| a.strip_prefix("--join=").map(str::to_owned))
    }
}
