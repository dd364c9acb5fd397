//! Operating-system seam
//!
//! Everything the provisioner asks of the host goes through [`Host`]:
//! - OS identification and the container-support feature
//! - the service manager
//! - the tooling-module registry
//! - program invocation and tool discovery
//!
//! [`SystemHost`] talks to the real machine; tests substitute a scripted host.

mod system;

use std::fmt;
use std::path::{Path, PathBuf};

pub use system::SystemHost;

use crate::error::Result;

/// Observed state of an OS service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Running,
    Stopped,
    StartPending,
    StopPending,
    Paused,
    Unknown,
}

impl ServiceState {
    /// Parse the service manager's status name
    pub fn parse(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "running" => ServiceState::Running,
            "stopped" => ServiceState::Stopped,
            "startpending" | "start_pending" => ServiceState::StartPending,
            "stoppending" | "stop_pending" => ServiceState::StopPending,
            "paused" => ServiceState::Paused,
            _ => ServiceState::Unknown,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceState::Running => "Running",
            ServiceState::Stopped => "Stopped",
            ServiceState::StartPending => "StartPending",
            ServiceState::StopPending => "StopPending",
            ServiceState::Paused => "Paused",
            ServiceState::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// A service and the state it must reach
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub name: String,
    pub required: ServiceState,
}

impl ServiceDescriptor {
    /// Service that must be observed Running
    pub fn running(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: ServiceState::Running,
        }
    }
}

/// Result of enabling the container-support feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureState {
    Enabled,
    RestartRequired,
}

/// A program run to completion with arguments.
///
/// Arguments listed as secrets are masked in [`Invocation::display`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    secrets: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            secrets: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add an argument whose `secret` part must never be logged
    pub fn secret_arg(mut self, arg: impl Into<String>, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        if !secret.is_empty() {
            self.secrets.push(secret);
        }
        self.args.push(arg.into());
        self
    }

    /// Command line suitable for logs
    pub fn display(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&mask(arg, &self.secrets));
        }
        line
    }
}

fn mask(arg: &str, secrets: &[String]) -> String {
    secrets
        .iter()
        .fold(arg.to_string(), |acc, secret| acc.replace(secret.as_str(), "****"))
}

/// Parameter value of a tooling-module command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Switch,
}

/// A command exported by a tooling module, with named parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleCommand {
    pub name: String,
    pub params: Vec<(String, ParamValue)>,
}

impl ModuleCommand {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .push((name.into(), ParamValue::Text(value.into())));
        self
    }

    /// Add a text parameter only when a value is present
    pub fn text_opt(self, name: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.text(name, value),
            None => self,
        }
    }

    pub fn switch(mut self, name: impl Into<String>) -> Self {
        self.params.push((name.into(), ParamValue::Switch));
        self
    }

    #[cfg(test)]
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Render as a shell command line, single-quoting text values
    pub fn render(&self) -> String {
        let mut line = self.name.clone();
        for (name, value) in &self.params {
            match value {
                ParamValue::Text(text) => {
                    line.push_str(&format!(" -{} {}", name, quote(text)));
                }
                ParamValue::Switch => line.push_str(&format!(" -{}", name)),
            }
        }
        line
    }
}

/// Single-quote a value for the host shell
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Everything the provisioner needs from the operating system
pub trait Host {
    /// Build number of the running OS release
    fn os_build_number(&self) -> Result<String>;

    /// Enable the container-support OS feature
    fn enable_container_feature(&self) -> Result<FeatureState>;

    /// Current state of a service, or `None` if it does not exist
    fn service_state(&self, name: &str) -> Result<Option<ServiceState>>;

    fn start_service(&self, name: &str) -> Result<()>;

    fn stop_service(&self, name: &str) -> Result<()>;

    /// Remove a service registration from the service manager
    fn delete_service(&self, name: &str) -> Result<()>;

    /// Run a program to completion; a non-zero exit is an error
    fn run(&self, invocation: &Invocation) -> Result<()>;

    /// Whether a tooling module is loaded into the current session
    fn module_loaded(&self, module: &str) -> Result<bool>;

    fn unload_module(&self, module: &str) -> Result<()>;

    /// Whether the module registry can find a module by name
    fn module_discoverable(&self, module: &str) -> Result<bool>;

    /// Import `module` and run one of its commands
    fn invoke_module_command(&self, module: &str, command: &ModuleCommand) -> Result<()>;

    /// Whether a command-line tool can be found on this host
    fn tool_available(&self, tool: &str) -> bool;
}
