//! Error types and handling for fleet-bootstrap
//!
//! Uses `thiserror` for error definitions and `miette` for diagnostic codes.
//!
//! This module is organized into sub-modules by error domain:
//! - [`validate`]: Host eligibility and parameter errors
//! - [`artifact`]: Download and integrity errors
//! - [`service`]: Service health errors
//! - [`component`]: Component install/uninstall and host invocation errors
//! - [`config`]: Settings file errors

pub mod artifact;
pub mod component;
pub mod config;
pub mod service;
pub mod validate;


use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for provisioning operations
#[derive(Error, Diagnostic, Debug)]
pub enum ProvisionError {
    // Validation errors
    #[error("Unsupported OS build '{build}'")]
    #[diagnostic(
        code(fleet::validate::unsupported_os),
        help("Supported hosts: Windows Server 2016, 2019, 20H2 and 2022")
    )]
    UnsupportedOs { build: String },

    #[error("Missing required parameter: {name}")]
    #[diagnostic(code(fleet::validate::missing_parameter))]
    MissingParameter { name: String },

    #[error("Precondition failed: {message}")]
    #[diagnostic(code(fleet::validate::precondition))]
    Precondition { message: String },

    // Artifact errors
    #[error("Failed to download s3://{bucket}/{key} to {path}{}", cause_suffix(.reason))]
    #[diagnostic(
        code(fleet::artifact::download_failed),
        help("Check the region, the bucket override and network access to blob storage")
    )]
    Download {
        bucket: String,
        key: String,
        path: String,
        reason: Option<String>,
    },

    #[error("Integrity check failed for {archive}: expected {expected}, got {actual}")]
    #[diagnostic(code(fleet::artifact::integrity))]
    Integrity {
        archive: String,
        expected: String,
        actual: String,
    },

    // Service errors
    #[error("Service '{service}' not found")]
    #[diagnostic(code(fleet::service::not_found))]
    ServiceNotFound { service: String },

    #[error("Service '{service}' is {state} after {attempts} checks, expected Running")]
    #[diagnostic(code(fleet::service::start_failed))]
    ServiceStart {
        service: String,
        attempts: u32,
        state: String,
    },

    // Component errors
    #[error("Failed to install {component}: {reason}")]
    #[diagnostic(code(fleet::component::install_failed))]
    Install { component: String, reason: String },

    #[error("Failed to install module {module}: {reason}")]
    #[diagnostic(code(fleet::component::module_install_failed))]
    ModuleInstall { module: String, reason: String },

    #[error("Failed to uninstall {component}: {reason}")]
    #[diagnostic(code(fleet::component::uninstall_failed))]
    Uninstall { component: String, reason: String },

    #[error("Host operation '{operation}' failed: {reason}")]
    #[diagnostic(code(fleet::host::operation_failed))]
    Host { operation: String, reason: String },

    // Configuration errors
    #[error("Failed to read settings file: {path}: {reason}")]
    #[diagnostic(code(fleet::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse settings file: {path}: {reason}")]
    #[diagnostic(
        code(fleet::config::parse_failed),
        help("The settings file is YAML with optional `layout` and `remote` sections")
    )]
    ConfigParseFailed { path: String, reason: String },

    // File system errors
    #[error("IO error: {message}")]
    #[diagnostic(code(fleet::fs::io_error))]
    Io { message: String },

    #[error("{step} failed: {source}")]
    #[diagnostic(code(fleet::step_failed))]
    Step {
        step: String,
        source: Box<ProvisionError>,
    },
}

fn cause_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(reason) => format!(": {reason}"),
        None => String::new(),
    }
}

/// Taxonomy tag of a [`ProvisionError`], independent of step context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedOs,
    MissingParameter,
    Precondition,
    Download,
    Integrity,
    ServiceNotFound,
    ServiceStart,
    Install,
    ModuleInstall,
    Uninstall,
    Host,
    Config,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::UnsupportedOs => "UnsupportedOSError",
            ErrorKind::MissingParameter => "MissingParameterError",
            ErrorKind::Precondition => "PreconditionError",
            ErrorKind::Download => "DownloadError",
            ErrorKind::Integrity => "IntegrityError",
            ErrorKind::ServiceNotFound => "ServiceNotFoundError",
            ErrorKind::ServiceStart => "ServiceStartError",
            ErrorKind::Install => "InstallError",
            ErrorKind::ModuleInstall => "ModuleInstallError",
            ErrorKind::Uninstall => "UninstallError",
            ErrorKind::Host => "HostError",
            ErrorKind::Config => "ConfigError",
            ErrorKind::Io => "IoError",
        };
        f.write_str(name)
    }
}

impl ProvisionError {
    /// Taxonomy tag, looking through step wrappers
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProvisionError::UnsupportedOs { .. } => ErrorKind::UnsupportedOs,
            ProvisionError::MissingParameter { .. } => ErrorKind::MissingParameter,
            ProvisionError::Precondition { .. } => ErrorKind::Precondition,
            ProvisionError::Download { .. } => ErrorKind::Download,
            ProvisionError::Integrity { .. } => ErrorKind::Integrity,
            ProvisionError::ServiceNotFound { .. } => ErrorKind::ServiceNotFound,
            ProvisionError::ServiceStart { .. } => ErrorKind::ServiceStart,
            ProvisionError::Install { .. } => ErrorKind::Install,
            ProvisionError::ModuleInstall { .. } => ErrorKind::ModuleInstall,
            ProvisionError::Uninstall { .. } => ErrorKind::Uninstall,
            ProvisionError::Host { .. } => ErrorKind::Host,
            ProvisionError::ConfigReadFailed { .. } | ProvisionError::ConfigParseFailed { .. } => {
                ErrorKind::Config
            }
            ProvisionError::Io { .. } => ErrorKind::Io,
            ProvisionError::Step { source, .. } => source.kind(),
        }
    }

    /// Name of the outermost step this error was raised in, if any
    pub fn step(&self) -> Option<&str> {
        match self {
            ProvisionError::Step { step, .. } => Some(step),
            _ => None,
        }
    }

    /// Wrap this error with the name of the step that produced it
    pub fn in_step(self, step: impl Into<String>) -> Self {
        ProvisionError::Step {
            step: step.into(),
            source: Box::new(self),
        }
    }
}

impl From<std::io::Error> for ProvisionError {
    fn from(err: std::io::Error) -> Self {
        ProvisionError::Io {
            message: err.to_string(),
        }
    }
}

impl From<walkdir::Error> for ProvisionError {
    fn from(err: walkdir::Error) -> Self {
        ProvisionError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, ProvisionError>;
