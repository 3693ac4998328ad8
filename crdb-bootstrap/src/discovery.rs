use super::*;

use std::net::IpAddr;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;

/// Answer of the name service for a single name.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Lookup {
    Found(Vec<IpAddr>),
    /// The name service answered definitively that the name does not exist.
    NotFound,
}

/// `Resolver` is the seam between discovery and the platform's name service.
/// Transient failures (timeouts, unreachable server) are returned as `Err`.
#[async_trait::async_trait]
pub trait Resolver: Send + Sync {
    async fn lookup(&self, fqdn: &str) -> std::io::Result<Lookup>;
}

#[async_trait::async_trait]
impl<R: Resolver + ?Sized> Resolver for Arc<R> {
    async fn lookup(&self, fqdn: &str) -> std::io::Result<Lookup> {
        (**self).lookup(fqdn).await
    }
}

/// Resolver backed by the system's `getaddrinfo`.
pub struct SystemResolver;

#[async_trait::async_trait]
impl Resolver for SystemResolver {
    async fn lookup(&self, fqdn: &str) -> std::io::Result<Lookup> {
        match tokio::net::lookup_host((fqdn, 0)).await {
            Ok(addrs) => {
                let mut ips: Vec<IpAddr> = addrs.map(|a| a.ip()).collect();
                ips.sort();
                ips.dedup();
                if ips.is_empty() {
                    Ok(Lookup::NotFound)
                } else {
                    Ok(Lookup::Found(ips))
                }
            }
            Err(e) if is_name_not_found(&e) => Ok(Lookup::NotFound),
            Err(e) => Err(e),
        }
    }
}

/// `getaddrinfo` failures only surface as text.
/// EAI_NONAME and EAI_NODATA are definitive. Everything else (EAI_AGAIN included) is transient.
fn is_name_not_found(e: &std::io::Error) -> bool {
    const NEGATIVE_ANSWERS: [&str; 4] = [
        "name or service not known",
        "nodename nor servname provided",
        "no address associated with hostname",
        "name does not resolve",
    ];
    let msg = e.to_string().to_ascii_lowercase();
    NEGATIVE_ANSWERS.iter().any(|s| msg.contains(s))
}

/// Hostnames of siblings currently resolvable, ordered by ordinal.
#[derive(Serialize, Clone, PartialEq, Eq, Debug, Default, Deref)]
pub struct PeerSet(Vec<String>);

impl PeerSet {
    pub fn new(mut peers: Vec<String>) -> Self {
        peers.dedup();
        Self(peers)
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

#[derive(Clone, Debug)]
pub struct DiscoveryPolicy {
    pub domain_suffix: String,
    /// Ordinals `0..max_peers` are candidates.
    pub max_peers: u32,
    pub attempts: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Wall-clock bound on the whole discovery including backoff.
    pub timeout: Duration,
}

impl Default for DiscoveryPolicy {
    fn default() -> Self {
        Self {
            domain_suffix: "svc.cluster.local".to_owned(),
            max_peers: 16,
            attempts: 5,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
            timeout: Duration::from_secs(30),
        }
    }
}

impl DiscoveryPolicy {
    /// Delays between attempts. `initial, 2*initial, 4*initial, ...` capped at `max_backoff`.
    fn backoff(&self) -> impl Iterator<Item = Duration> {
        let factor = (self.initial_backoff.as_millis() as u64 / 2).max(1);
        ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(self.max_backoff)
            .take(self.attempts.saturating_sub(1))
    }
}

enum AttemptError {
    /// The name service answered but no sibling is published yet.
    NoPeers,
    Transient(String),
}

pub struct PeerDiscovery<R> {
    resolver: R,
    policy: DiscoveryPolicy,
}

impl<R: Resolver> PeerDiscovery<R> {
    pub fn new(resolver: R, policy: DiscoveryPolicy) -> Self {
        Self { resolver, policy }
    }

    pub fn policy(&self) -> &DiscoveryPolicy {
        &self.policy
    }

    /// Resolve the siblings of `identity` in its peer group.
    ///
    /// An empty answer is retried because records for a just-started sibling may lag.
    /// Once the attempts are used up an empty answer is returned as an empty set.
    /// Any visible sibling is returned at once, even if other lookups failed.
    /// With nothing visible, transient failures on the last attempt, or running past the
    /// timeout, fail with `DiscoveryUnavailable`. Deciding blind could found a second cluster.
    pub async fn resolve_peers(
        &self,
        identity: &ReplicaIdentity,
        exclude_self: bool,
    ) -> Result<PeerSet, Error> {
        let mut attempts = 0;
        let retry = RetryIf::spawn(
            self.policy.backoff(),
            || {
                attempts += 1;
                self.attempt(identity, exclude_self, attempts)
            },
            |_: &AttemptError| true,
        );
        let res = tokio::time::timeout(self.policy.timeout, retry).await;

        match res {
            Ok(Ok(peers)) => {
                info!("discovered peers {:?} after {attempts} attempt(s)", *peers);
                Ok(peers)
            }
            Ok(Err(AttemptError::NoPeers)) => {
                info!("no peers visible after {attempts} attempt(s)");
                Ok(PeerSet::default())
            }
            Ok(Err(AttemptError::Transient(reason))) => {
                Err(Error::DiscoveryUnavailable { attempts, reason })
            }
            Err(_) => Err(Error::DiscoveryUnavailable {
                attempts,
                reason: format!("timed out after {:?}", self.policy.timeout),
            }),
        }
    }

    async fn attempt(
        &self,
        identity: &ReplicaIdentity,
        exclude_self: bool,
        n: usize,
    ) -> Result<PeerSet, AttemptError> {
        let suffix = &self.policy.domain_suffix;

        // Records are published for unready replicas too, so our own name must resolve.
        // If it doesn't, the name service can't be trusted to show that no sibling exists.
        let own = identity.fqdn(suffix);
        let mut failure = match self.resolver.lookup(&own).await {
            Ok(Lookup::Found(_)) => None,
            Ok(Lookup::NotFound) => {
                warn!("attempt {n}: own name {own} is not published yet");
                Some(format!("own name {own} is not published"))
            }
            Err(e) => {
                warn!("attempt {n}: failed to resolve {own}: {e}");
                Some(format!("{own}: {e}"))
            }
        };

        let candidates = (0..self.policy.max_peers)
            .map(Ordinal)
            .filter(|&o| !(exclude_self && o == identity.ordinal));
        let lookups = candidates.map(|o| async move {
            let fqdn = identity.sibling_fqdn(o, suffix);
            let res = self.resolver.lookup(&fqdn).await;
            (o, fqdn, res)
        });
        let results = futures::future::join_all(lookups).await;

        let mut peers = vec![];
        for (o, fqdn, res) in results {
            match res {
                Ok(Lookup::Found(addrs)) if !addrs.is_empty() => {
                    debug!("attempt {n}: {fqdn} -> {addrs:?}");
                    peers.push(identity.sibling_name(o));
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("attempt {n}: failed to resolve {fqdn}: {e}");
                    failure.get_or_insert(format!("{fqdn}: {e}"));
                }
            }
        }

        // Any visible sibling settles it, whatever else failed.
        if !peers.is_empty() {
            return Ok(PeerSet::new(peers));
        }
        if let Some(reason) = failure {
            return Err(AttemptError::Transient(reason));
        }
        debug!("attempt {n}: no peers visible");
        Err(AttemptError::NoPeers)
    }
}
