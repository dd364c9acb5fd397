//! Component installers
//!
//! Each component is a pair of actions over the verified artifact tree and
//! the [`InstallationContext`]. None is idempotent on its own; install
//! actions clear previous state before writing.

pub mod exec_support;
pub mod fleet;
pub mod management;
pub mod runtime;
pub mod tooling;

use crate::config::Settings;
use crate::context::InstallationContext;
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::health::HealthMonitor;
use crate::host::Host;
use crate::temp::TempWorkspace;

pub use exec_support::ExecSupport;
pub use fleet::FleetAgent;
pub use management::ManagementAgent;
pub use runtime::ContainerRuntime;
pub use tooling::ToolingModule;

/// Everything a component action may use during one run
pub struct StepEnv<'a> {
    pub context: &'a InstallationContext,
    pub settings: &'a Settings,
    pub host: &'a dyn Host,
    pub fetcher: &'a Fetcher<'a>,
    pub monitor: &'a HealthMonitor<'a>,
    pub workspace: &'a TempWorkspace,
}

/// An installable unit of the host setup
pub trait Component {
    /// Human-readable name used in step labels and errors
    fn name(&self) -> &'static str;

    fn install(&self, env: &StepEnv<'_>) -> Result<()>;

    /// Remove the component; components without a removal action do nothing
    fn uninstall(&self, _env: &StepEnv<'_>) -> Result<()> {
        Ok(())
    }
}
