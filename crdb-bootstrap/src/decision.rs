use super::*;

#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug, Display)]
#[serde(rename_all = "lowercase")]
pub enum BootstrapMode {
    /// Found a brand-new cluster.
    Initialize,
    /// Connect to the cluster that already exists.
    Join,
}

/// `Initialize` always carries no seed.
#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
pub struct BootstrapDecision {
    pub mode: BootstrapMode,
    pub seed_addresses: Vec<String>,
}

impl BootstrapDecision {
    pub fn initialize() -> Self {
        Self {
            mode: BootstrapMode::Initialize,
            seed_addresses: vec![],
        }
    }

    pub fn join(seed: impl Into<String>) -> Self {
        Self {
            mode: BootstrapMode::Join,
            seed_addresses: vec![seed.into()],
        }
    }
}

#[derive(Clone, Debug)]
pub struct BootstrapInput {
    pub assigned_name: String,
    pub peer_group: String,
    pub namespace: String,
    /// Stable group-level address joiners are pointed at.
    pub join_address: String,
}

#[derive(Clone, Debug)]
pub enum State {
    Start,
    IdentityKnown(ReplicaIdentity),
    SentinelChecked {
        identity: ReplicaIdentity,
        present: bool,
    },
    PeersChecked {
        identity: ReplicaIdentity,
        peers: PeerSet,
    },
    Decided {
        identity: ReplicaIdentity,
        decision: BootstrapDecision,
    },
    /// The sentinel is durable and the decision is final.
    Terminal {
        identity: ReplicaIdentity,
        decision: BootstrapDecision,
    },
}

impl State {
    pub fn name(&self) -> &'static str {
        match self {
            State::Start => "Start",
            State::IdentityKnown(_) => "IdentityKnown",
            State::SentinelChecked { .. } => "SentinelChecked",
            State::PeersChecked { .. } => "PeersChecked",
            State::Decided { .. } => "Decided",
            State::Terminal { .. } => "Terminal",
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct Outcome {
    pub identity: ReplicaIdentity,
    pub decision: BootstrapDecision,
    /// States visited, in order.
    pub trace: Vec<&'static str>,
}

/// `DecisionEngine` decides whether this replica founds a cluster or joins one.
///
/// Any evidence of an existing cluster means join: a non-zero ordinal, a sentinel on the
/// volume, or any visible sibling however stale. This does not exclude two founders.
/// Two replicas that both see an empty peer set at the same moment will both initialize.
pub struct DecisionEngine<R> {
    input: BootstrapInput,
    sentinel: SentinelStore,
    discovery: PeerDiscovery<R>,
}

impl<R: Resolver> DecisionEngine<R> {
    pub fn new(input: BootstrapInput, sentinel: SentinelStore, discovery: PeerDiscovery<R>) -> Self {
        Self {
            input,
            sentinel,
            discovery,
        }
    }

    fn join(&self) -> BootstrapDecision {
        BootstrapDecision::join(&self.input.join_address)
    }

    /// Advance one transition. `Terminal` is absorbing.
    pub async fn step(&self, state: State) -> Result<State, Error> {
        let next = match state {
            State::Start => {
                let identity = ReplicaIdentity::resolve(
                    &self.input.assigned_name,
                    &self.input.peer_group,
                    &self.input.namespace,
                )?;
                info!(
                    "replica {} has ordinal {} in namespace {}",
                    identity.name(),
                    identity.ordinal,
                    identity.namespace
                );
                State::IdentityKnown(identity)
            }
            State::IdentityKnown(identity) => {
                if identity.ordinal.is_founder() {
                    let present = self.sentinel.has_sentinel()?;
                    State::SentinelChecked { identity, present }
                } else {
                    info!("ordinal {} is never a founder. join", identity.ordinal);
                    State::Decided {
                        identity,
                        decision: self.join(),
                    }
                }
            }
            State::SentinelChecked { identity, present } => {
                if present {
                    info!(
                        "sentinel {} found. this volume already belongs to a cluster. join",
                        self.sentinel.path().display()
                    );
                    State::Decided {
                        identity,
                        decision: self.join(),
                    }
                } else {
                    info!("no sentinel. looking for siblings");
                    let peers = self.discovery.resolve_peers(&identity, true).await?;
                    State::PeersChecked { identity, peers }
                }
            }
            State::PeersChecked { identity, peers } => {
                let decision = if peers.is_empty() {
                    info!("no sibling visible. initialize a new cluster");
                    BootstrapDecision::initialize()
                } else {
                    info!("siblings {:?} visible. join", *peers);
                    self.join()
                };
                State::Decided { identity, decision }
            }
            State::Decided { identity, decision } => {
                self.sentinel.write_sentinel()?;
                State::Terminal { identity, decision }
            }
            terminal @ State::Terminal { .. } => terminal,
        };
        debug!("-> {}", next.name());
        Ok(next)
    }

    /// Run up to `Decided` without touching the volume.
    pub async fn decide(&self) -> Result<Outcome, Error> {
        self.drive(false).await
    }

    /// Decide and make the sentinel durable.
    pub async fn run(&self) -> Result<Outcome, Error> {
        self.drive(true).await
    }

    async fn drive(&self, commit: bool) -> Result<Outcome, Error> {
        let mut state = State::Start;
        let mut trace = vec![state.name()];
        loop {
            state = match state {
                State::Decided { identity, decision } if !commit => {
                    return Ok(Outcome {
                        identity,
                        decision,
                        trace,
                    })
                }
                State::Terminal { identity, decision } => {
                    return Ok(Outcome {
                        identity,
                        decision,
                        trace,
                    })
                }
                state => self.step(state).await?,
            };
            trace.push(state.name());
        }
    }
}
