//! Provisioning state machine
//!
//! Runs the shared preamble and then one branch:
//!
//! ```text
//! Init -> ValidatingEnvironment -> EnablingHostFeature -> FetchingArtifacts
//!      -> InstallingToolingModule -> InstallBranch | UninstallBranch -> Done
//! ```
//!
//! `RestartRequired` and `Failed` are the other terminal phases. Steps run
//! strictly in sequence; the first failure ends the run. The workspace is
//! removed before [`Provisioner::run`] returns, whatever the outcome.


use std::cell::Cell;
use std::fmt;
use std::path::PathBuf;

use tracing::{debug, error, info, warn};

use crate::components::{
    Component, ContainerRuntime, ExecSupport, FleetAgent, ManagementAgent, StepEnv, ToolingModule,
};
use crate::config::Settings;
use crate::context::InstallationContext;
use crate::error::{ProvisionError, Result};
use crate::fetch::{BlobStore, Fetcher};
use crate::health::{HealthMonitor, HealthPolicy};
use crate::host::{FeatureState, Host};
use crate::temp::TempWorkspace;
use crate::validate::{REQUIRED_TOOLS, validate_capabilities, validate_os_release, validate_parameters};

/// Phase the provisioner has reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    ValidatingEnvironment,
    EnablingHostFeature,
    FetchingArtifacts,
    InstallingToolingModule,
    InstallBranch,
    UninstallBranch,
    Done,
    RestartRequired,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Terminal result of a run
#[derive(Debug)]
pub enum RunOutcome {
    Done,
    /// The host must restart before installation can continue
    RestartRequired,
    Failed(ProvisionError),
}

impl RunOutcome {
    /// Process exit status: soft-terminal outcomes count as success
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Done | RunOutcome::RestartRequired => 0,
            RunOutcome::Failed(_) => 1,
        }
    }

    /// Emit the single aggregated line for a failed run
    pub fn report(&self) {
        if let RunOutcome::Failed(e) = self {
            // Step errors render as "<step> failed: <cause>"
            error!(
                step = e.step().unwrap_or("startup"),
                "[ERROR] {} ({})",
                e,
                e.kind()
            );
        }
    }
}

/// One entry of a branch plan
pub struct InstallStep {
    pub order: usize,
    pub component: Box<dyn Component>,
}

impl InstallStep {
    /// Number components from 1 in the order given
    fn sequence(components: Vec<Box<dyn Component>>) -> Vec<Self> {
        components
            .into_iter()
            .enumerate()
            .map(|(index, component)| Self {
                order: index + 1,
                component,
            })
            .collect()
    }

    pub fn name(&self) -> &'static str {
        self.component.name()
    }
}

/// Install branch, in forward dependency order
pub fn install_plan(context: &InstallationContext) -> Vec<InstallStep> {
    let mut components: Vec<Box<dyn Component>> = vec![Box::new(ContainerRuntime)];
    if !context.skip_registration() {
        components.push(Box::new(ManagementAgent));
    }
    components.push(Box::new(ExecSupport));
    components.push(Box::new(FleetAgent));
    InstallStep::sequence(components)
}

/// Uninstall branch: the fleet agent goes before the agent it depends on
pub fn uninstall_plan() -> Vec<InstallStep> {
    InstallStep::sequence(vec![Box::new(FleetAgent), Box::new(ManagementAgent)])
}

/// Drives one install or uninstall run against a host
pub struct Provisioner<'a> {
    context: &'a InstallationContext,
    settings: &'a Settings,
    host: &'a dyn Host,
    store: &'a dyn BlobStore,
    policy: HealthPolicy,
    temp_base: Option<PathBuf>,
    phase: Cell<Phase>,
}

impl<'a> Provisioner<'a> {
    pub fn new(
        context: &'a InstallationContext,
        settings: &'a Settings,
        host: &'a dyn Host,
        store: &'a dyn BlobStore,
    ) -> Self {
        Self {
            context,
            settings,
            host,
            store,
            policy: HealthPolicy::default(),
            temp_base: None,
            phase: Cell::new(Phase::Init),
        }
    }

    pub fn with_health_policy(mut self, policy: HealthPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Create the workspace under `base` instead of the system temp root
    #[cfg(test)]
    pub fn with_temp_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.temp_base = Some(base.into());
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    /// Run to a terminal outcome
    pub fn run(&self) -> RunOutcome {
        info!(
            "{} starting for region {}",
            self.context.mode_name(),
            self.context.region()
        );

        let created = match &self.temp_base {
            Some(base) => TempWorkspace::create_in(base),
            None => TempWorkspace::create(),
        };
        let workspace = match created {
            Ok(workspace) => workspace,
            Err(e) => {
                self.enter(Phase::Failed);
                return RunOutcome::Failed(e.in_step("create workspace"));
            }
        };

        let outcome = match self.execute(&workspace) {
            Ok(outcome) => outcome,
            Err(e) => RunOutcome::Failed(e),
        };

        if let Err(e) = workspace.close() {
            warn!("Failed to remove workspace: {}", e);
        }

        match &outcome {
            RunOutcome::Done => {
                self.enter(Phase::Done);
                info!("{} completed successfully", self.context.mode_name());
            }
            RunOutcome::RestartRequired => {
                self.enter(Phase::RestartRequired);
                warn!("Restart the host and run again to finish");
            }
            RunOutcome::Failed(_) => self.enter(Phase::Failed),
        }
        outcome
    }

    fn execute(&self, workspace: &TempWorkspace) -> Result<RunOutcome> {
        let monitor = HealthMonitor::new(self.host, self.policy);
        let fetcher = Fetcher::new(self.store);

        self.enter(Phase::ValidatingEnvironment);
        self.run_step("check host tools", || {
            validate_capabilities(self.host, REQUIRED_TOOLS)
        })?;
        let release = self.run_step("validate OS release", || {
            validate_os_release(&self.host.os_build_number()?)
        })?;
        info!("Host runs {}", release);
        self.run_step("validate parameters", || {
            validate_parameters(self.context, &monitor)
        })?;

        self.enter(Phase::EnablingHostFeature);
        let feature = self.run_step("enable container feature", || {
            self.host.enable_container_feature()
        })?;
        if feature == FeatureState::RestartRequired {
            warn!("Enabling container support requires a restart");
            return Ok(RunOutcome::RestartRequired);
        }

        self.enter(Phase::FetchingArtifacts);
        let remote = &self.settings.remote;
        self.run_step("fetch artifacts", || {
            fetcher.fetch_and_verify(
                &remote.artifact_bucket_for(self.context),
                &remote.artifact_key,
                &remote.artifact_hash_key,
                &workspace.downloads_dir(),
                &workspace.artifacts_dir(),
            )
        })?;

        let env = StepEnv {
            context: self.context,
            settings: self.settings,
            host: self.host,
            fetcher: &fetcher,
            monitor: &monitor,
            workspace,
        };

        self.enter(Phase::InstallingToolingModule);
        self.run_step("install tooling module", || ToolingModule.install(&env))?;

        if self.context.is_uninstall() {
            self.enter(Phase::UninstallBranch);
            for step in uninstall_plan() {
                debug!("Branch step {}: {}", step.order, step.name());
                self.run_step(&format!("remove {}", step.name()), || {
                    step.component.uninstall(&env)
                })?;
            }
        } else {
            self.enter(Phase::InstallBranch);
            for step in install_plan(self.context) {
                debug!("Branch step {}: {}", step.order, step.name());
                self.run_step(&format!("install {}", step.name()), || {
                    step.component.install(&env)
                })?;
            }
        }

        Ok(RunOutcome::Done)
    }

    fn run_step<T>(&self, name: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        info!("Step: {}", name);
        f().map_err(|e| e.in_step(name))
    }

    fn enter(&self, phase: Phase) {
        let from = self.phase.replace(phase);
        if from != phase {
            info!("Phase {} -> {}", from, phase);
        }
    }
}
