//! Remote blob storage layout
//!
//! Buckets are per-region; bucket names are templates where `{region}` is
//! substituted. Object keys are fixed relative paths.

use serde::{Deserialize, Serialize};

use crate::context::InstallationContext;

/// Bucket names, object keys and the URL scheme for remote artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteLayout {
    /// Bucket holding the management agent installer
    pub management_bucket: String,

    /// Management agent installer object
    pub management_installer_key: String,

    /// Bucket holding the fleet agent source bundle
    pub fleet_agent_bucket: String,

    /// Bucket holding the installation artifact archive
    pub artifact_bucket: String,

    /// Installation artifact archive (gzip-compressed tar)
    pub artifact_key: String,

    /// SHA-256 sidecar of the artifact archive
    pub artifact_hash_key: String,

    /// Object URL, with `{bucket}`, `{region}` and `{key}` placeholders
    pub blob_url_template: String,
}

impl Default for RemoteLayout {
    fn default() -> Self {
        Self {
            management_bucket: "amazon-ssm-{region}".to_string(),
            management_installer_key: "latest/windows_amd64/AmazonSSMAgentSetup.exe".to_string(),
            fleet_agent_bucket: "amazon-ecs-agent-{region}".to_string(),
            artifact_bucket: "amazon-ecs-agent-{region}".to_string(),
            artifact_key: "ecs-anywhere-windows/ecs-anywhere-artifacts.tar.gz".to_string(),
            artifact_hash_key: "ecs-anywhere-windows/ecs-anywhere-artifacts.tar.gz.sha256"
                .to_string(),
            blob_url_template: "https://{bucket}.s3.{region}.amazonaws.com/{key}".to_string(),
        }
    }
}

impl RemoteLayout {
    pub fn management_bucket_for(&self, region: &str) -> String {
        self.management_bucket.replace("{region}", region)
    }

    /// Fleet agent bucket, honoring the context's source override
    pub fn fleet_agent_bucket_for(&self, context: &InstallationContext) -> String {
        match context.fleet_agent_bucket() {
            Some(bucket) => bucket.to_string(),
            None => self.fleet_agent_bucket.replace("{region}", context.region()),
        }
    }

    /// Artifact bucket, honoring the context's artifact-source override
    pub fn artifact_bucket_for(&self, context: &InstallationContext) -> String {
        match context.artifact_bucket() {
            Some(bucket) => bucket.to_string(),
            None => self.artifact_bucket.replace("{region}", context.region()),
        }
    }

    /// File name the management installer is cached under
    pub fn management_installer_file(&self) -> &str {
        self.management_installer_key
            .rsplit('/')
            .next()
            .unwrap_or(&self.management_installer_key)
    }

    pub fn object_url(&self, bucket: &str, region: &str, key: &str) -> String {
        self.blob_url_template
            .replace("{bucket}", bucket)
            .replace("{region}", region)
            .replace("{key}", key.trim_start_matches('/'))
    }
}
