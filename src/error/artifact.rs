//! Artifact acquisition errors

use std::path::Path;

use super::ProvisionError;

/// Creates a download error for an object that never reached `path`.
///
/// `cause` is the transfer failure, when the transfer reported one.
pub fn download_failed(
    bucket: &str,
    key: &str,
    path: &Path,
    cause: Option<String>,
) -> ProvisionError {
    ProvisionError::Download {
        bucket: bucket.to_string(),
        key: key.to_string(),
        path: path.display().to_string(),
        reason: cause,
    }
}

/// Creates an integrity error
pub fn integrity(
    archive: &Path,
    expected: impl Into<String>,
    actual: impl Into<String>,
) -> ProvisionError {
    ProvisionError::Integrity {
        archive: archive.display().to_string(),
        expected: expected.into(),
        actual: actual.into(),
    }
}
