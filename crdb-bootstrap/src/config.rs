use super::*;

use clap::Parser;
use std::path::PathBuf;

/// Decide whether this replica founds a new cluster or joins an existing one,
/// then hand over to the database process.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Config {
    /// Name of the peer group (the headless discovery service).
    #[arg(long, env = "PEER_GROUP")]
    pub peer_group: String,

    /// Network name assigned to this replica, `<peer-group>-<ordinal>`.
    #[arg(long, env = "HOSTNAME")]
    pub hostname: String,

    /// Namespace this replica runs in.
    #[arg(long, env = "POD_NAMESPACE")]
    pub namespace: String,

    /// Name-resolution domain suffix appended after the namespace.
    #[arg(long, default_value = "svc.cluster.local")]
    pub domain_suffix: String,

    /// Stable load-balancing address advertised as the seed when joining.
    /// Defaults to `<peer-group>-public`.
    #[arg(long)]
    pub join_address: Option<String>,

    /// Persistent data directory of the database.
    #[arg(long, default_value = "/cockroach/cockroach-data")]
    pub data_dir: PathBuf,

    /// File name of the sentinel inside the data directory.
    #[arg(long, default_value = "cluster_exists_marker")]
    pub sentinel_name: String,

    /// Sibling ordinals in `0..max_peers` are probed during discovery.
    #[arg(long, default_value_t = 16)]
    pub max_peers: u32,

    #[arg(long, default_value_t = 5)]
    pub discovery_attempts: usize,

    #[arg(long, default_value = "200ms", value_parser = humantime::parse_duration)]
    pub initial_backoff: Duration,

    #[arg(long, default_value = "2s", value_parser = humantime::parse_duration)]
    pub max_backoff: Duration,

    /// Hard upper bound on the whole discovery phase.
    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration)]
    pub discovery_timeout: Duration,

    #[arg(long, default_value = "25%")]
    pub cache: String,

    #[arg(long, default_value = "25%")]
    pub max_sql_memory: String,

    #[arg(long, default_value = "0.0.0.0")]
    pub http_host: String,

    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long)]
    pub http_port: Option<u16>,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub insecure: bool,

    /// Run the database as a child process instead of replacing this process.
    #[arg(long)]
    pub spawn: bool,

    /// Print the decision and the command line as JSON without launching anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Database executable started once the decision is made.
    pub command: PathBuf,

    /// Extra arguments appended verbatim to the generated command line.
    #[arg(last = true)]
    pub extra_args: Vec<String>,
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));

        if !is_dns_label(&self.peer_group) {
            return invalid(format!("peer group `{}` is not a DNS label", self.peer_group));
        }
        if !is_dns_label(&self.namespace) {
            return invalid(format!("namespace `{}` is not a DNS label", self.namespace));
        }
        if self.domain_suffix.is_empty() || !self.domain_suffix.split('.').all(is_dns_label) {
            return invalid(format!(
                "domain suffix `{}` is not a domain name",
                self.domain_suffix
            ));
        }
        if self.join_address().is_empty() {
            return invalid("join address is empty".to_owned());
        }
        if self.sentinel_name.is_empty() || self.sentinel_name.contains('/') {
            return invalid(format!(
                "sentinel name `{}` must be a plain file name",
                self.sentinel_name
            ));
        }
        if self.max_peers == 0 {
            return invalid("max peers must be at least 1".to_owned());
        }
        if self.discovery_attempts == 0 {
            return invalid("discovery attempts must be at least 1".to_owned());
        }
        if self.initial_backoff > self.max_backoff {
            return invalid(format!(
                "initial backoff {:?} exceeds max backoff {:?}",
                self.initial_backoff, self.max_backoff
            ));
        }
        if self.discovery_timeout.is_zero() {
            return invalid("discovery timeout must be positive".to_owned());
        }
        for (knob, v) in [("cache", &self.cache), ("max-sql-memory", &self.max_sql_memory)] {
            if !is_memory_size(v) {
                return invalid(format!("{knob} `{v}` is not a size or percentage"));
            }
        }
        if self.command.as_os_str().is_empty() {
            return invalid("command is empty".to_owned());
        }
        Ok(())
    }

    pub fn join_address(&self) -> String {
        match &self.join_address {
            Some(addr) => addr.clone(),
            None => format!("{}-public", self.peer_group),
        }
    }

    pub fn discovery_policy(&self) -> discovery::DiscoveryPolicy {
        discovery::DiscoveryPolicy {
            domain_suffix: self.domain_suffix.clone(),
            max_peers: self.max_peers,
            attempts: self.discovery_attempts,
            initial_backoff: self.initial_backoff,
            max_backoff: self.max_backoff,
            timeout: self.discovery_timeout,
        }
    }

    pub fn launch_options(&self) -> launcher::LaunchOptions {
        launcher::LaunchOptions {
            program: self.command.clone(),
            data_dir: self.data_dir.clone(),
            domain_suffix: self.domain_suffix.clone(),
            http_host: self.http_host.clone(),
            port: self.port,
            http_port: self.http_port,
            cache: self.cache.clone(),
            max_sql_memory: self.max_sql_memory.clone(),
            insecure: self.insecure,
            extra_args: self.extra_args.clone(),
        }
    }
}

fn is_dns_label(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 63
        && s.bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !s.starts_with('-')
        && !s.ends_with('-')
}

/// Accepts `25%`, `.25` and byte sizes like `1GiB`. Only percentages are range-checked here.
fn is_memory_size(s: &str) -> bool {
    if let Some(pct) = s.strip_suffix('%') {
        return matches!(pct.parse::<f64>(), Ok(p) if p > 0.0 && p <= 100.0);
    }
    !s.is_empty() && s.starts_with(|c: char| c.is_ascii_digit() || c == '.')
}
