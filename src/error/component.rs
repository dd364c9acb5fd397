//! Component action and host invocation errors
//!
//! Component errors carry the underlying cause's message rather than the
//! cause itself, so the wrapped kind stays the component's.

use super::ProvisionError;

/// Creates an install error wrapping `cause`
pub fn install_failed(component: &str, cause: impl ToString) -> ProvisionError {
    ProvisionError::Install {
        component: component.to_string(),
        reason: cause.to_string(),
    }
}

/// Creates a module install error wrapping `cause`
pub fn module_install_failed(module: &str, cause: impl ToString) -> ProvisionError {
    ProvisionError::ModuleInstall {
        module: module.to_string(),
        reason: cause.to_string(),
    }
}

/// Creates an uninstall error wrapping `cause`
pub fn uninstall_failed(component: &str, cause: impl ToString) -> ProvisionError {
    ProvisionError::Uninstall {
        component: component.to_string(),
        reason: cause.to_string(),
    }
}

/// Creates a host operation error
pub fn host_failed(operation: impl Into<String>, reason: impl Into<String>) -> ProvisionError {
    ProvisionError::Host {
        operation: operation.into(),
        reason: reason.into(),
    }
}
