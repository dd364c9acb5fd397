//! CLI definitions using clap derive API

use clap::Parser;
use clap::builder::{Styles, styling::AnsiColor};
use std::path::PathBuf;

use crate::context::{DEFAULT_CLUSTER, DEFAULT_VERSION};

/// fleet-bootstrap - attach a standalone host to a container fleet
///
/// Installs, or cleanly uninstalls, everything a host needs to run fleet workloads.
#[derive(Parser, Debug)]
#[command(
    name = "fleet-bootstrap",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Attach a standalone host to a remote container fleet",
    long_about = "fleet-bootstrap installs the container runtime, the management agent and the \
                  fleet agent on this host and registers it with the fleet control plane. \
                  With --uninstall it removes the fleet and management agents again.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  fleet-bootstrap --region us-west-2 --activation-id ID --activation-code CODE --cluster prod\n   \
                  fleet-bootstrap --region us-west-2 --skip-registration --cluster prod\n   \
                  fleet-bootstrap --region us-west-2 --uninstall\n"
)]
pub struct Cli {
    /// Target control-plane and artifact-source region
    #[arg(long, env = "FLEET_REGION")]
    pub region: String,

    /// Management agent activation ID
    #[arg(long, env = "FLEET_ACTIVATION_ID")]
    pub activation_id: Option<String>,

    /// Management agent activation code
    #[arg(long, env = "FLEET_ACTIVATION_CODE", hide_env_values = true)]
    pub activation_code: Option<String>,

    /// Fleet the agent registers into
    #[arg(long, default_value = DEFAULT_CLUSTER)]
    pub cluster: String,

    /// Fleet agent version pin
    #[arg(long = "agent-version", value_name = "VERSION", default_value = DEFAULT_VERSION)]
    pub agent_version: String,

    /// Skip management agent installation (it must already be running)
    #[arg(long)]
    pub skip_registration: bool,

    /// Remove the fleet agent and the management agent
    #[arg(long)]
    pub uninstall: bool,

    /// Alternate control-plane endpoint
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Alternate bucket for the installation artifact bundle
    #[arg(long, value_name = "BUCKET")]
    pub artifact_bucket: Option<String>,

    /// Alternate bucket for the fleet agent source bundle
    #[arg(long, value_name = "BUCKET")]
    pub fleet_agent_bucket: Option<String>,

    /// YAML settings file overriding host paths and remote layout
    #[arg(long, value_name = "FILE", env = "FLEET_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Service health checks before giving up
    #[arg(long, value_name = "N", default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    pub health_attempts: u32,

    /// Seconds between service health checks
    #[arg(long, value_name = "SECS", default_value_t = 5)]
    pub health_interval_secs: u64,

    /// Enable verbose output
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
