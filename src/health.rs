//! Service health gating with bounded polling

use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::Result;
use crate::error::service::{not_found, start_failed};
use crate::host::{Host, ServiceDescriptor};

/// Default number of observations before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default pause between observations
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Attempt budget for [`HealthMonitor::wait_until_running`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthPolicy {
    max_attempts: u32,
    interval: Duration,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_INTERVAL)
    }
}

impl HealthPolicy {
    /// At least one observation is always made
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Polls the host service manager until a service reaches its required state
pub struct HealthMonitor<'h> {
    host: &'h dyn Host,
    policy: HealthPolicy,
}

impl<'h> HealthMonitor<'h> {
    pub fn new(host: &'h dyn Host, policy: HealthPolicy) -> Self {
        Self { host, policy }
    }

    /// Wait for `service` to be observed Running.
    ///
    /// Returns the number of observations made. A service that does not exist
    /// fails immediately without retrying. Otherwise exactly `max_attempts`
    /// observations are made before failing, with the policy interval slept
    /// between consecutive observations only.
    pub fn wait_until_running(&self, service: &ServiceDescriptor) -> Result<u32> {
        let name = service.name.as_str();
        let mut attempt = 1;

        loop {
            let state = self
                .host
                .service_state(name)?
                .ok_or_else(|| not_found(name))?;
            debug!(
                "Service {} is {} (check {}/{})",
                name, state, attempt, self.policy.max_attempts
            );

            if state == service.required {
                info!("Service {} is {}", name, state);
                return Ok(attempt);
            }

            if attempt >= self.policy.max_attempts {
                return Err(start_failed(name, attempt, state));
            }

            thread::sleep(self.policy.interval);
            attempt += 1;
        }
    }
}
