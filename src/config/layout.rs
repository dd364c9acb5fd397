//! Persisted filesystem layout on the host
//!
//! Every directory the installers write to is named here. Defaults follow the
//! standard program-files / program-data locations; tests relocate the whole
//! layout under one root with [`HostLayout::rooted`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Archive built by the execution-support step inside the fleet data dir
pub const EXEC_SUPPORT_ARCHIVE: &str = "ssm-binaries.tar.gz";

/// Installation directories used by the component installers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostLayout {
    /// Container runtime binaries
    pub runtime_dir: PathBuf,

    /// Fleet agent installation
    pub fleet_agent_dir: PathBuf,

    /// Fleet agent image/config cache
    pub fleet_cache_dir: PathBuf,

    /// Fleet agent persistent data (holds the execution-support archive)
    pub fleet_data_dir: PathBuf,

    /// Tooling module directory, discoverable by the host module registry
    pub module_dir: PathBuf,

    /// Management agent installation, packaged by the execution-support step
    pub management_agent_dir: PathBuf,
}

impl Default for HostLayout {
    fn default() -> Self {
        Self::system()
    }
}

impl HostLayout {
    /// Layout under the host's standard program-files and program-data roots
    pub fn system() -> Self {
        let program_files = std::env::var_os("ProgramFiles")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(r"C:\Program Files"));
        let program_data = std::env::var_os("ProgramData")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(r"C:\ProgramData"));

        Self::from_roots(&program_files, &program_data)
    }

    /// Layout relocated under `root`
    #[cfg(test)]
    pub fn rooted(root: &Path) -> Self {
        Self::from_roots(&root.join("Program Files"), &root.join("ProgramData"))
    }

    fn from_roots(program_files: &Path, program_data: &Path) -> Self {
        let fleet_data = program_data.join("Amazon").join("ECS");
        Self {
            runtime_dir: program_files.join("docker"),
            fleet_agent_dir: program_files.join("Amazon").join("ECS"),
            fleet_cache_dir: fleet_data.join("cache"),
            fleet_data_dir: fleet_data.join("data"),
            module_dir: program_files
                .join("WindowsPowerShell")
                .join("Modules")
                .join("ECSTools"),
            management_agent_dir: program_files.join("Amazon").join("SSM"),
        }
    }

    /// Path of the execution-support archive
    pub fn exec_support_archive(&self) -> PathBuf {
        self.fleet_data_dir.join(EXEC_SUPPORT_ARCHIVE)
    }
}
