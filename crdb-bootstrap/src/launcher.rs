use super::*;

use std::path::PathBuf;
use std::process::Command;

#[derive(Clone, Debug)]
pub struct LaunchOptions {
    pub program: PathBuf,
    pub data_dir: PathBuf,
    pub domain_suffix: String,
    pub http_host: String,
    pub port: Option<u16>,
    pub http_port: Option<u16>,
    pub cache: String,
    pub max_sql_memory: String,
    pub insecure: bool,
    pub extra_args: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LaunchMode {
    /// Replace this process image. The platform supervises the database directly.
    Exec,
    /// Run the database as a child and exit with its status.
    Spawn,
}

/// Final command line of the database process.
#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
pub struct LaunchPlan {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl LaunchPlan {
    pub fn new(
        opts: &LaunchOptions,
        identity: &ReplicaIdentity,
        decision: &BootstrapDecision,
    ) -> Self {
        let mut args = vec!["start".to_owned(), "--logtostderr".to_owned()];
        if opts.insecure {
            args.push("--insecure".to_owned());
        }
        args.push(format!("--store={}", opts.data_dir.display()));
        args.push(format!("--host={}", identity.fqdn(&opts.domain_suffix)));
        if let Some(port) = opts.port {
            args.push(format!("--port={port}"));
        }
        args.push(format!("--http-host={}", opts.http_host));
        if let Some(port) = opts.http_port {
            args.push(format!("--http-port={port}"));
        }
        args.push(format!("--cache={}", opts.cache));
        args.push(format!("--max-sql-memory={}", opts.max_sql_memory));
        match decision.mode {
            BootstrapMode::Join => {
                args.push(format!("--join={}", decision.seed_addresses.join(",")));
            }
            BootstrapMode::Initialize => {}
        }
        args.extend(opts.extra_args.iter().cloned());

        Self {
            program: opts.program.clone(),
            args,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Hand control to the database process.
    /// In `Exec` mode this only returns on failure.
    pub fn launch(self, mode: LaunchMode) -> Result<(), Error> {
        info!("launching {} {}", self.program_name(), self.args.join(" "));
        match mode {
            LaunchMode::Exec => Err(self.exec()),
            LaunchMode::Spawn => self.spawn_and_wait(),
        }
    }

    #[cfg(unix)]
    fn exec(self) -> Error {
        use std::os::unix::process::CommandExt;

        let source = self.command().exec();
        Error::LaunchFailure {
            program: self.program_name(),
            source,
        }
    }

    #[cfg(not(unix))]
    fn exec(self) -> Error {
        match self.spawn_and_wait() {
            Ok(()) => std::process::exit(0),
            Err(e) => e,
        }
    }

    /// The child is not restarted here. Restarts belong to the platform.
    fn spawn_and_wait(self) -> Result<(), Error> {
        let launch_failure = |source| Error::LaunchFailure {
            program: self.program_name(),
            source,
        };
        let mut child = self.command().spawn().map_err(launch_failure)?;
        info!("started {} (pid={})", self.program_name(), child.id());

        let status = child.wait().map_err(launch_failure)?;
        if status.success() {
            return Ok(());
        }
        let code = exit_code_of(&status);
        warn!("{} exited with {status}", self.program_name());
        Err(Error::MainProcessExited(code))
    }
}

#[cfg(unix)]
fn exit_code_of(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code_of(status: &std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
