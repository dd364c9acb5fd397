//! Execution-support archive builder
//!
//! Packages the installed management agent into the fleet agent's data
//! directory so task containers can run remote commands.

use tracing::info;

use super::{Component, StepEnv};
use crate::error::Result;
use crate::error::component::install_failed;
use crate::error::validate::precondition;
use crate::fetch::archive::pack_tar_gz;

pub struct ExecSupport;

impl ExecSupport {
    fn build(&self, env: &StepEnv<'_>) -> Result<()> {
        let layout = &env.settings.layout;
        let source = &layout.management_agent_dir;
        if !source.is_dir() {
            return Err(precondition(format!(
                "management agent directory {} not found",
                source.display()
            )));
        }

        let archive = layout.exec_support_archive();
        if archive.exists() {
            std::fs::remove_file(&archive)?;
            info!("Removed previous {}", archive.display());
        }
        std::fs::create_dir_all(&layout.fleet_data_dir)?;

        pack_tar_gz(source, &archive)?;
        info!("Built {} from {}", archive.display(), source.display());
        Ok(())
    }
}

impl Component for ExecSupport {
    fn name(&self) -> &'static str {
        "execution support"
    }

    fn install(&self, env: &StepEnv<'_>) -> Result<()> {
        self.build(env).map_err(|e| install_failed(self.name(), e))
    }
}
