//! Service health errors

use super::ProvisionError;

/// Creates a service not found error
pub fn not_found(service: impl Into<String>) -> ProvisionError {
    ProvisionError::ServiceNotFound {
        service: service.into(),
    }
}

/// Creates a service start error after `attempts` observations
pub fn start_failed(service: impl Into<String>, attempts: u32, state: impl ToString) -> ProvisionError {
    ProvisionError::ServiceStart {
        service: service.into(),
        attempts,
        state: state.to_string(),
    }
}
