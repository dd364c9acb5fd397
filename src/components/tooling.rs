//! Tooling module installer
//!
//! The module is installed in the shared preamble of both branches, since
//! fleet agent removal also goes through its commands.

use tracing::info;
use walkdir::WalkDir;

use super::{Component, StepEnv};
use crate::common::fs::{copy_dir_recursive, remove_dir_if_exists};
use crate::error::Result;
use crate::error::component::module_install_failed;
use crate::error::validate::precondition;
use crate::host::Host;

/// Name the module registers under
pub const MODULE_NAME: &str = "ECSTools";

/// Directory of module files inside the artifact tree
pub const ARTIFACT_MODULE_DIR: &str = "ECSTools";

/// Number of files a complete module ships
pub const MODULE_FILE_COUNT: usize = 3;

pub struct ToolingModule;

impl ToolingModule {
    fn install_files(&self, env: &StepEnv<'_>) -> Result<()> {
        let module_dir = &env.settings.layout.module_dir;

        unload_if_loaded(env.host)?;
        remove_dir_if_exists(module_dir)?;

        let source = env.workspace.artifacts_dir().join(ARTIFACT_MODULE_DIR);
        copy_dir_recursive(&source, module_dir)?;

        let present = count_files(module_dir)?;
        if present != MODULE_FILE_COUNT {
            return Err(precondition(format!(
                "expected {} module files in {}, found {}",
                MODULE_FILE_COUNT,
                module_dir.display(),
                present
            )));
        }

        if !env.host.module_discoverable(MODULE_NAME)? {
            return Err(precondition(format!(
                "module {} is not discoverable after install",
                MODULE_NAME
            )));
        }
        Ok(())
    }
}

impl Component for ToolingModule {
    fn name(&self) -> &'static str {
        "tooling module"
    }

    fn install(&self, env: &StepEnv<'_>) -> Result<()> {
        self.install_files(env)
            .map_err(|e| module_install_failed(MODULE_NAME, e))?;
        info!("Module {} installed", MODULE_NAME);
        Ok(())
    }

    fn uninstall(&self, env: &StepEnv<'_>) -> Result<()> {
        remove_module(env)
    }
}

/// Unload the module from the session and delete its directory
pub fn remove_module(env: &StepEnv<'_>) -> Result<()> {
    unload_if_loaded(env.host)?;
    if remove_dir_if_exists(&env.settings.layout.module_dir)? {
        info!("Module {} removed", MODULE_NAME);
    }
    Ok(())
}

fn unload_if_loaded(host: &dyn Host) -> Result<()> {
    if host.module_loaded(MODULE_NAME)? {
        host.unload_module(MODULE_NAME)?;
    }
    Ok(())
}

fn count_files(dir: &std::path::Path) -> Result<usize> {
    let mut count = 0;
    for entry in WalkDir::new(dir) {
        if entry?.file_type().is_file() {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_fixtures::{FakeHost, Harness, MODULE_FILES, install_context};

    #[test]
    fn test_install_replaces_module_dir() {
        let harness = Harness::new();
        harness.seed_previous_install();
        let host = FakeHost::healthy().with_loaded_module();

        harness
            .with_env(&install_context(), &host, |env| ToolingModule.install(env))
            .unwrap();

        let module_dir = &harness.layout().module_dir;
        assert!(!module_dir.join("stale.txt").exists());
        for file in MODULE_FILES {
            assert!(module_dir.join(file).is_file());
        }
        assert!(!host.is_module_loaded());
        assert!(
            host.call_index("unload_module").unwrap() < host.call_index("module_discoverable").unwrap()
        );
    }

    #[test]
    fn test_loaded_check_skips_unload_when_not_loaded() {
        let harness = Harness::new();
        let host = FakeHost::healthy();

        harness
            .with_env(&install_context(), &host, |env| ToolingModule.install(env))
            .unwrap();

        assert_eq!(host.call_index("unload_module"), None);
    }

    #[test]
    fn test_undiscoverable_module_fails() {
        let harness = Harness::new();
        let host = FakeHost::healthy().undiscoverable();

        let err = harness
            .with_env(&install_context(), &host, |env| ToolingModule.install(env))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ModuleInstall);
        assert!(err.to_string().contains("not discoverable"));
    }

    #[test]
    fn test_wrong_file_count_fails() {
        let harness = Harness::new();
        let host = FakeHost::healthy();

        let err = harness
            .with_env(&install_context(), &host, |env| {
                let extra = env.workspace.artifacts_dir().join(ARTIFACT_MODULE_DIR).join("extra.ps1");
                std::fs::write(extra, "# extra").unwrap();
                ToolingModule.install(env)
            })
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ModuleInstall);
        assert!(err.to_string().contains("found 4"));
    }

    #[test]
    fn test_remove_module_deletes_directory() {
        let harness = Harness::new();
        harness.seed_previous_install();
        let host = FakeHost::healthy().with_loaded_module();

        harness
            .with_env(&install_context(), &host, |env| ToolingModule.uninstall(env))
            .unwrap();

        assert!(!harness.layout().module_dir.exists());
        assert!(!host.is_module_loaded());
    }
}
