//! Management agent installer
//!
//! Registration happens through the installer's arguments; the activation
//! code is masked wherever the command line is logged.

use std::path::PathBuf;

use tracing::info;

use super::{Component, StepEnv};
use crate::error::Result;
use crate::error::component::{install_failed, uninstall_failed};
use crate::error::validate::missing_parameter;
use crate::host::{Invocation, ServiceDescriptor, ServiceState};

/// OS service registered by the management agent
pub const MANAGEMENT_SERVICE: &str = "AmazonSSMAgent";

const INSTALL_LOG: &str = "ssm-install.log";

pub struct ManagementAgent;

impl ManagementAgent {
    /// Cached installer path, downloading it on first use
    fn installer(&self, env: &StepEnv<'_>) -> Result<PathBuf> {
        let remote = &env.settings.remote;
        let path = env
            .workspace
            .downloads_dir()
            .join(remote.management_installer_file());

        if path.is_file() {
            info!("Using cached installer {}", path.display());
            return Ok(path);
        }

        env.fetcher.fetch(
            &remote.management_bucket_for(env.context.region()),
            &remote.management_installer_key,
            &path,
        )?;
        Ok(path)
    }

    fn register(&self, env: &StepEnv<'_>) -> Result<()> {
        let context = env.context;
        let id = context
            .activation_id()
            .ok_or_else(|| missing_parameter("activation-id"))?;
        let code = context
            .activation_code()
            .ok_or_else(|| missing_parameter("activation-code"))?;

        let installer = self.installer(env)?;
        let log = env.workspace.path().join(INSTALL_LOG);
        let invocation = Invocation::new(installer)
            .arg("/q")
            .arg("/log")
            .arg(log.display().to_string())
            .secret_arg(format!("CODE={code}"), code)
            .arg(format!("ID={id}"))
            .arg(format!("REGION={}", context.region()));

        info!("Running {}", invocation.display());
        env.host.run(&invocation)
    }

    fn remove(&self, env: &StepEnv<'_>) -> Result<()> {
        match env.host.service_state(MANAGEMENT_SERVICE)? {
            Some(state) => {
                if state != ServiceState::Stopped {
                    env.host.stop_service(MANAGEMENT_SERVICE)?;
                }
                env.host.delete_service(MANAGEMENT_SERVICE)?;
                info!("Deleted service {}", MANAGEMENT_SERVICE);
            }
            None => info!("Service {} not present", MANAGEMENT_SERVICE),
        }

        let installer = self.installer(env)?;
        env.host.run(
            &Invocation::new(installer).args(["/uninstall", "/q", "/norestart"]),
        )
    }
}

impl Component for ManagementAgent {
    fn name(&self) -> &'static str {
        "management agent"
    }

    fn install(&self, env: &StepEnv<'_>) -> Result<()> {
        self.register(env)
            .map_err(|e| install_failed(self.name(), e))?;
        env.monitor
            .wait_until_running(&ServiceDescriptor::running(MANAGEMENT_SERVICE))?;
        info!("Management agent registered in {}", env.context.region());
        Ok(())
    }

    fn uninstall(&self, env: &StepEnv<'_>) -> Result<()> {
        self.remove(env)
            .map_err(|e| uninstall_failed(self.name(), e))?;
        info!("Management agent removed");
        Ok(())
    }
}
