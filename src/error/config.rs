//! Settings file errors

use std::path::Path;

use super::ProvisionError;

/// Creates a settings read error
pub fn read_failed(path: &Path, reason: impl ToString) -> ProvisionError {
    ProvisionError::ConfigReadFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Creates a settings parse error
pub fn parse_failed(path: &Path, reason: impl ToString) -> ProvisionError {
    ProvisionError::ConfigParseFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}
