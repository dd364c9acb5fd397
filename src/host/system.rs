//! Host implementation backed by PowerShell and the Windows service manager

use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use super::{FeatureState, Host, Invocation, ModuleCommand, ServiceState, quote};
use crate::error::Result;
use crate::error::component::host_failed;

/// Shell every host query is run through
const DEFAULT_SHELL: &str = "powershell.exe";

/// The real host, driven through a non-interactive PowerShell
#[derive(Debug, Clone)]
pub struct SystemHost {
    shell: PathBuf,
}

impl Default for SystemHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemHost {
    pub fn new() -> Self {
        Self {
            shell: PathBuf::from(DEFAULT_SHELL),
        }
    }

    /// Run a script and return its trimmed standard output
    fn powershell(&self, operation: &str, script: &str) -> Result<String> {
        debug!("{}: {}", operation, script);
        let output = Command::new(&self.shell)
            .args([
                "-NoProfile",
                "-NonInteractive",
                "-ExecutionPolicy",
                "Bypass",
                "-Command",
                script,
            ])
            .output()
            .map_err(|e| host_failed(operation, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(host_failed(
                operation,
                format!(
                    "exit code {}: {}",
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                ),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn powershell_bool(&self, operation: &str, script: &str) -> Result<bool> {
        let out = self.powershell(operation, script)?;
        Ok(out.eq_ignore_ascii_case("true"))
    }
}

impl Host for SystemHost {
    fn os_build_number(&self) -> Result<String> {
        self.powershell(
            "read OS build",
            "[System.Environment]::OSVersion.Version.Build",
        )
    }

    fn enable_container_feature(&self) -> Result<FeatureState> {
        let restart = self.powershell(
            "enable Containers feature",
            "(Install-WindowsFeature -Name Containers).RestartNeeded",
        )?;
        if restart.eq_ignore_ascii_case("yes") {
            Ok(FeatureState::RestartRequired)
        } else {
            Ok(FeatureState::Enabled)
        }
    }

    fn service_state(&self, name: &str) -> Result<Option<ServiceState>> {
        let script = format!(
            "$s = Get-Service -Name {} -ErrorAction SilentlyContinue; if ($s) {{ $s.Status.ToString() }}",
            quote(name)
        );
        let status = self.powershell(&format!("query service {name}"), &script)?;
        if status.is_empty() {
            Ok(None)
        } else {
            Ok(Some(ServiceState::parse(&status)))
        }
    }

    fn start_service(&self, name: &str) -> Result<()> {
        self.powershell(
            &format!("start service {name}"),
            &format!("Start-Service -Name {}", quote(name)),
        )
        .map(drop)
    }

    fn stop_service(&self, name: &str) -> Result<()> {
        self.powershell(
            &format!("stop service {name}"),
            &format!("Stop-Service -Name {} -Force", quote(name)),
        )
        .map(drop)
    }

    fn delete_service(&self, name: &str) -> Result<()> {
        self.powershell(
            &format!("delete service {name}"),
            &format!("& sc.exe delete {}", quote(name)),
        )
        .map(drop)
    }

    fn run(&self, invocation: &Invocation) -> Result<()> {
        let line = invocation.display();
        debug!("Running {}", line);
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()
            .map_err(|e| host_failed(&line, e.to_string()))?;

        if !status.success() {
            return Err(host_failed(
                line,
                format!("exit code {}", status.code().unwrap_or(-1)),
            ));
        }
        Ok(())
    }

    fn module_loaded(&self, module: &str) -> Result<bool> {
        self.powershell_bool(
            &format!("query module {module}"),
            &format!("[bool](Get-Module -Name {})", quote(module)),
        )
    }

    fn unload_module(&self, module: &str) -> Result<()> {
        self.powershell(
            &format!("unload module {module}"),
            &format!("Remove-Module -Name {} -Force", quote(module)),
        )
        .map(drop)
    }

    fn module_discoverable(&self, module: &str) -> Result<bool> {
        self.powershell_bool(
            &format!("discover module {module}"),
            &format!("[bool](Get-Module -ListAvailable -Name {})", quote(module)),
        )
    }

    fn invoke_module_command(&self, module: &str, command: &ModuleCommand) -> Result<()> {
        let script = format!(
            "$ErrorActionPreference = 'Stop'; Import-Module {} -Force; {}",
            quote(module),
            command.render()
        );
        self.powershell(&command.name, &script).map(drop)
    }

    fn tool_available(&self, tool: &str) -> bool {
        let Some(paths) = std::env::var_os("PATH") else {
            return false;
        };
        std::env::split_paths(&paths).any(|dir| {
            dir.join(tool).is_file() || dir.join(format!("{tool}.exe")).is_file()
        })
    }
}
