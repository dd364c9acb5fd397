//! Container runtime installer

use tracing::info;

use super::{Component, StepEnv};
use crate::common::fs::{copy_dir_recursive, remove_dir_if_exists};
use crate::error::Result;
use crate::error::component::install_failed;
use crate::host::{Invocation, ServiceState};

/// OS service registered by the runtime
pub const RUNTIME_SERVICE: &str = "docker";

/// Directory of runtime binaries inside the artifact tree
pub const ARTIFACT_RUNTIME_DIR: &str = "docker";

const DAEMON_BINARY: &str = "dockerd.exe";
const CLIENT_BINARY: &str = "docker.exe";

pub struct ContainerRuntime;

impl ContainerRuntime {
    fn clear_previous(&self, env: &StepEnv<'_>) -> Result<()> {
        let runtime_dir = &env.settings.layout.runtime_dir;
        if !runtime_dir.exists() {
            return Ok(());
        }

        if env.host.service_state(RUNTIME_SERVICE)? == Some(ServiceState::Running) {
            info!("Stopping running {} service", RUNTIME_SERVICE);
            env.host.stop_service(RUNTIME_SERVICE)?;
        }
        remove_dir_if_exists(runtime_dir)?;
        info!("Removed previous runtime at {}", runtime_dir.display());
        Ok(())
    }

    fn install_binaries(&self, env: &StepEnv<'_>) -> Result<()> {
        let runtime_dir = &env.settings.layout.runtime_dir;
        let source = env.workspace.artifacts_dir().join(ARTIFACT_RUNTIME_DIR);

        std::fs::create_dir_all(runtime_dir)?;
        let copied = copy_dir_recursive(&source, runtime_dir)?;
        info!("Copied {} runtime files to {}", copied, runtime_dir.display());

        env.host
            .run(&Invocation::new(runtime_dir.join(DAEMON_BINARY)).arg("--register-service"))?;
        env.host.start_service(RUNTIME_SERVICE)?;
        env.host
            .run(&Invocation::new(runtime_dir.join(CLIENT_BINARY)).arg("info"))?;
        Ok(())
    }
}

impl Component for ContainerRuntime {
    fn name(&self) -> &'static str {
        "container runtime"
    }

    fn install(&self, env: &StepEnv<'_>) -> Result<()> {
        self.clear_previous(env)
            .and_then(|_| self.install_binaries(env))
            .map_err(|e| install_failed(self.name(), e))?;
        info!("Container runtime installed");
        Ok(())
    }
}
