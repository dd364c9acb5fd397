//! Fleet agent installer
//!
//! The agent is set up and torn down through the tooling module's commands.

use tracing::info;

use super::tooling::{MODULE_NAME, remove_module};
use super::{Component, StepEnv};
use crate::common::fs::remove_dir_if_exists;
use crate::error::Result;
use crate::error::component::{install_failed, uninstall_failed};
use crate::host::{ModuleCommand, ServiceDescriptor};

/// OS service registered by the fleet agent
pub const FLEET_SERVICE: &str = "AmazonECS";

/// Log drivers the agent is allowed to use
pub const LOGGING_DRIVERS: &str = r#"["json-file","awslogs"]"#;

const INITIALIZE_COMMAND: &str = "Initialize-ECSAgent";
const REMOVE_COMMAND: &str = "Remove-ECSAgent";

pub struct FleetAgent;

impl FleetAgent {
    /// Initialization command carrying the full parameter set
    pub fn initialize_command(env: &StepEnv<'_>) -> ModuleCommand {
        let context = env.context;
        ModuleCommand::new(INITIALIZE_COMMAND)
            .text("Cluster", context.cluster())
            .text("Region", context.region())
            .text("Version", context.version())
            .text(
                "AgentSourceBucket",
                env.settings.remote.fleet_agent_bucket_for(context),
            )
            .text_opt("ECSEndpoint", context.endpoint())
            .text("LoggingDrivers", LOGGING_DRIVERS)
            .switch("ExternalInstance")
            .switch("EnableTaskIAMRole")
    }

    fn remove(&self, env: &StepEnv<'_>) -> Result<()> {
        let layout = &env.settings.layout;
        env.host
            .invoke_module_command(MODULE_NAME, &ModuleCommand::new(REMOVE_COMMAND))?;
        remove_dir_if_exists(&layout.fleet_agent_dir)?;
        remove_dir_if_exists(&layout.fleet_cache_dir)?;
        remove_module(env)
    }
}

impl Component for FleetAgent {
    fn name(&self) -> &'static str {
        "fleet agent"
    }

    fn install(&self, env: &StepEnv<'_>) -> Result<()> {
        env.host
            .invoke_module_command(MODULE_NAME, &Self::initialize_command(env))
            .map_err(|e| install_failed(self.name(), e))?;
        env.monitor
            .wait_until_running(&ServiceDescriptor::running(FLEET_SERVICE))?;
        info!(
            "Fleet agent {} joined cluster {}",
            env.context.version(),
            env.context.cluster()
        );
        Ok(())
    }

    fn uninstall(&self, env: &StepEnv<'_>) -> Result<()> {
        self.remove(env)
            .map_err(|e| uninstall_failed(self.name(), e))?;
        info!("Fleet agent removed");
        Ok(())
    }
}
