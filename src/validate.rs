//! Pre-flight validation
//!
//! Runs before any host mutation or network access:
//! - the OS release must be on the supported allow-list
//! - install parameters must be complete and consistent
//! - tools the run shells out to must be present (never installed implicitly)

use tracing::{info, warn};

use crate::components::management::MANAGEMENT_SERVICE;
use crate::context::InstallationContext;
use crate::error::Result;
use crate::error::validate::{missing_parameter, precondition, unsupported_os};
use crate::health::HealthMonitor;
use crate::host::{Host, ServiceDescriptor};

/// Supported OS build numbers and their release names
pub const SUPPORTED_RELEASES: &[(&str, &str)] = &[
    ("14393", "Windows Server 2016"),
    ("17763", "Windows Server 2019"),
    ("19042", "Windows Server 20H2"),
    ("20348", "Windows Server 2022"),
];

/// Host tools every run depends on
pub const REQUIRED_TOOLS: &[&str] = &["powershell"];

/// Check a build number against the allow-list, returning the release name
pub fn validate_os_release(build_number: &str) -> Result<&'static str> {
    let build_number = build_number.trim();
    SUPPORTED_RELEASES
        .iter()
        .find(|(build, _)| *build == build_number)
        .map(|(_, name)| *name)
        .ok_or_else(|| unsupported_os(build_number))
}

/// Check argument consistency for the selected branch.
///
/// Uninstall runs bypass these checks. With registration skipped, the
/// management agent must already be observed Running.
pub fn validate_parameters(context: &InstallationContext, monitor: &HealthMonitor<'_>) -> Result<()> {
    if context.is_uninstall() {
        if context.skip_registration() {
            warn!(
                "--skip-registration has no defined meaning with --uninstall; \
                 the management agent will still be removed"
            );
        }
        return Ok(());
    }

    if context.cluster().trim().is_empty() {
        return Err(missing_parameter("cluster"));
    }

    if context.skip_registration() {
        let service = ServiceDescriptor::running(MANAGEMENT_SERVICE);
        monitor.wait_until_running(&service).map_err(|e| {
            precondition(format!(
                "registration is skipped but the management agent is not running: {e}"
            ))
        })?;
        info!("Management agent already running, skipping registration");
        return Ok(());
    }

    if context.activation_id().is_none() {
        return Err(missing_parameter("activation-id"));
    }
    if context.activation_code().is_none() {
        return Err(missing_parameter("activation-code"));
    }
    Ok(())
}

/// Fail closed if a required host tool is missing
pub fn validate_capabilities(host: &dyn Host, tools: &[&str]) -> Result<()> {
    let missing: Vec<&str> = tools
        .iter()
        .copied()
        .filter(|tool| !host.tool_available(tool))
        .collect();

    if !missing.is_empty() {
        return Err(precondition(format!(
            "required tools not found: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}
