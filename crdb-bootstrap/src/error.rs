use super::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("assigned name `{name}` does not match `{peer_group}-<ordinal>`")]
    MalformedIdentity { name: String, peer_group: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("sentinel at {path} is not accessible. error={source}")]
    SentinelIo {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("peer discovery unavailable after {attempts} attempt(s): {reason}")]
    DiscoveryUnavailable { attempts: usize, reason: String },
    #[error("failed to launch {program}. error={source}")]
    LaunchFailure {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("main process exited with code {0}")]
    MainProcessExited(i32),
}

impl Error {
    /// Process exit code the bootstrap terminates with.
    /// Every fatal condition maps to a non-zero code so the platform restarts the replica.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::MalformedIdentity { .. } | Error::InvalidConfig(_) => 2,
            Error::SentinelIo { .. } => 3,
            Error::DiscoveryUnavailable { .. } => 4,
            Error::LaunchFailure { .. } => 5,
            Error::MainProcessExited(code) if *code != 0 => *code,
            Error::MainProcessExited(_) => 5,
        }
    }
}
