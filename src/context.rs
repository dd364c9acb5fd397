//! Immutable per-run installation parameters
//!
//! Built once from the command line and passed by reference to every
//! component. There are no setters once built.

use std::fmt;

use crate::cli::Cli;

/// Default fleet grouping
pub const DEFAULT_CLUSTER: &str = "default";

/// Default fleet agent version pin
pub const DEFAULT_VERSION: &str = "latest";

/// Validated-at-start, read-only parameters of one run
#[derive(Clone, PartialEq, Eq)]
pub struct InstallationContext {
    region: String,
    activation_id: Option<String>,
    activation_code: Option<String>,
    cluster: String,
    version: String,
    endpoint: Option<String>,
    artifact_bucket: Option<String>,
    fleet_agent_bucket: Option<String>,
    skip_registration: bool,
    uninstall: bool,
}

impl InstallationContext {
    pub fn builder(region: impl Into<String>) -> ContextBuilder {
        ContextBuilder {
            inner: InstallationContext {
                region: region.into(),
                activation_id: None,
                activation_code: None,
                cluster: DEFAULT_CLUSTER.to_string(),
                version: DEFAULT_VERSION.to_string(),
                endpoint: None,
                artifact_bucket: None,
                fleet_agent_bucket: None,
                skip_registration: false,
                uninstall: false,
            },
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn activation_id(&self) -> Option<&str> {
        self.activation_id.as_deref()
    }

    pub fn activation_code(&self) -> Option<&str> {
        self.activation_code.as_deref()
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Control-plane endpoint override
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Artifact-source bucket override
    pub fn artifact_bucket(&self) -> Option<&str> {
        self.artifact_bucket.as_deref()
    }

    /// Fleet agent source bucket override
    pub fn fleet_agent_bucket(&self) -> Option<&str> {
        self.fleet_agent_bucket.as_deref()
    }

    pub fn skip_registration(&self) -> bool {
        self.skip_registration
    }

    pub fn is_uninstall(&self) -> bool {
        self.uninstall
    }

    /// Human-readable name of the branch this run takes
    pub fn mode_name(&self) -> &'static str {
        if self.uninstall {
            "Uninstall"
        } else {
            "Installation"
        }
    }
}

// Activation code is a credential; keep it out of debug logs.
impl fmt::Debug for InstallationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallationContext")
            .field("region", &self.region)
            .field("activation_id", &self.activation_id)
            .field(
                "activation_code",
                &self.activation_code.as_ref().map(|_| "<redacted>"),
            )
            .field("cluster", &self.cluster)
            .field("version", &self.version)
            .field("endpoint", &self.endpoint)
            .field("artifact_bucket", &self.artifact_bucket)
            .field("fleet_agent_bucket", &self.fleet_agent_bucket)
            .field("skip_registration", &self.skip_registration)
            .field("uninstall", &self.uninstall)
            .finish()
    }
}

/// One-shot builder for [`InstallationContext`]
#[derive(Debug)]
pub struct ContextBuilder {
    inner: InstallationContext,
}

impl ContextBuilder {
    #[cfg(test)]
    pub fn activation(mut self, id: impl Into<String>, code: impl Into<String>) -> Self {
        self.inner.activation_id = Some(id.into());
        self.inner.activation_code = Some(code.into());
        self
    }

    pub fn activation_id(mut self, id: Option<String>) -> Self {
        self.inner.activation_id = id;
        self
    }

    pub fn activation_code(mut self, code: Option<String>) -> Self {
        self.inner.activation_code = code;
        self
    }

    pub fn cluster(mut self, cluster: impl Into<String>) -> Self {
        self.inner.cluster = cluster.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.inner.version = version.into();
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.inner.endpoint = Some(endpoint.into());
        self
    }

    pub fn artifact_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.inner.artifact_bucket = Some(bucket.into());
        self
    }

    pub fn fleet_agent_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.inner.fleet_agent_bucket = Some(bucket.into());
        self
    }

    pub fn skip_registration(mut self, skip: bool) -> Self {
        self.inner.skip_registration = skip;
        self
    }

    pub fn uninstall(mut self, uninstall: bool) -> Self {
        self.inner.uninstall = uninstall;
        self
    }

    pub fn build(self) -> InstallationContext {
        self.inner
    }
}

impl From<&Cli> for InstallationContext {
    fn from(cli: &Cli) -> Self {
        let mut builder = InstallationContext::builder(cli.region.clone())
            .activation_id(non_empty(&cli.activation_id))
            .activation_code(non_empty(&cli.activation_code))
            .cluster(cli.cluster.clone())
            .version(cli.agent_version.clone())
            .skip_registration(cli.skip_registration)
            .uninstall(cli.uninstall);

        if let Some(endpoint) = non_empty(&cli.endpoint) {
            builder = builder.endpoint(endpoint);
        }
        if let Some(bucket) = non_empty(&cli.artifact_bucket) {
            builder = builder.artifact_bucket(bucket);
        }
        if let Some(bucket) = non_empty(&cli.fleet_agent_bucket) {
            builder = builder.fleet_agent_bucket(bucket);
        }

        builder.build()
    }
}

/// Blank option values count as absent
fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
