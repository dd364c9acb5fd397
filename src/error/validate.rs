//! Host eligibility and parameter errors

use super::ProvisionError;

/// Creates an unsupported OS error
pub fn unsupported_os(build: impl Into<String>) -> ProvisionError {
    ProvisionError::UnsupportedOs {
        build: build.into(),
    }
}

/// Creates a missing parameter error
pub fn missing_parameter(name: impl Into<String>) -> ProvisionError {
    ProvisionError::MissingParameter { name: name.into() }
}

/// Creates a precondition error
pub fn precondition(message: impl Into<String>) -> ProvisionError {
    ProvisionError::Precondition {
        message: message.into(),
    }
}
