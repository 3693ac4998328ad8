use anyhow::Result;
use clap::Parser;
use crdb_bootstrap::{Config, LaunchMode, SystemResolver};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let format = tracing_subscriber::fmt::format()
        .with_target(false)
        .compact();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .event_format(format)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(config: Config) -> Result<()> {
    let commit = !config.dry_run;
    let (outcome, plan) = crdb_bootstrap::bootstrap_blocking(&config, SystemResolver, commit)?;

    info!(
        "decision for {}: {} {:?} (trace={})",
        outcome.identity.name(),
        outcome.decision.mode,
        outcome.decision.seed_addresses,
        outcome.trace.join(" -> ")
    );

    if config.dry_run {
        let report = serde_json::json!({
            "identity": outcome.identity,
            "decision": outcome.decision,
            "program": plan.program,
            "args": plan.args,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mode = if config.spawn {
        LaunchMode::Spawn
    } else {
        LaunchMode::Exec
    };
    plan.launch(mode)?;
    Ok(())
}

fn main() {
    init_logging();
    let config = Config::parse();

    if let Err(e) = run(config) {
        error!("bootstrap failed: {e:#}");
        let code = e
            .downcast_ref::<crdb_bootstrap::Error>()
            .map(|e| e.exit_code())
            .unwrap_or(1);
        std::process::exit(code);
    }
}
