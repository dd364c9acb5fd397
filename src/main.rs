//! fleet-bootstrap - host provisioning for a remote container fleet
//!
//! Installs, or cleanly uninstalls, the container runtime, tooling module,
//! management agent and fleet agent on a standalone host in one
//! non-interactive run.

use clap::Parser;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod cli;
mod common;
mod components;
mod config;
mod context;
mod error;
mod fetch;
mod hash;
mod health;
mod host;
mod orchestrator;
mod progress;
mod temp;
#[cfg(test)]
mod test_fixtures;
mod validate;

use cli::Cli;
use config::Settings;
use context::InstallationContext;
use error::Result;
use fetch::HttpBlobStore;
use health::HealthPolicy;
use host::SystemHost;
use orchestrator::{Provisioner, RunOutcome};

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false)
                .with_ansi(false),
        )
        .init();
}

fn run(cli: &Cli) -> Result<RunOutcome> {
    let settings = Settings::load(cli.settings.as_deref())?;
    let context = InstallationContext::from(cli);
    debug!("{:?}", context);

    let host = SystemHost::new();
    let store = HttpBlobStore::new(context.region(), settings.remote.clone())?;
    let policy = HealthPolicy::new(
        cli.health_attempts,
        Duration::from_secs(cli.health_interval_secs),
    );
    debug!(
        "Health checks: {} attempts, {:?} apart",
        policy.max_attempts(),
        policy.interval()
    );

    let provisioner =
        Provisioner::new(&context, &settings, &host, &store).with_health_policy(policy);
    let outcome = provisioner.run();
    debug!("Finished in phase {}", provisioner.phase());
    Ok(outcome)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = run(&cli).unwrap_or_else(RunOutcome::Failed);

    outcome.report();

    std::process::exit(outcome.exit_code());
}
