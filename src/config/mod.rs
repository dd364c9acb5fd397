//! Configuration handling for fleet-bootstrap
//!
//! This module contains data structures for:
//! - [`HostLayout`] - persisted installation paths on the host
//! - [`RemoteLayout`] - per-region buckets and object keys
//! - [`Settings`] - an optional YAML file overriding either of the above

pub mod layout;
pub mod remote;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, config as config_error};

// Re-export commonly used types
pub use layout::HostLayout;
pub use remote::RemoteLayout;

/// Settings loaded once per run, before any host mutation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Persisted installation paths
    pub layout: HostLayout,

    /// Remote blob storage layout
    pub remote: RemoteLayout,
}

impl Settings {
    /// Load settings from an optional YAML file.
    ///
    /// Fields absent from the file keep their system defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let yaml = std::fs::read_to_string(path).map_err(|e| config_error::read_failed(path, e))?;
        let settings = Self::from_yaml(&yaml).map_err(|e| config_error::parse_failed(path, e))?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Parse settings from a YAML string
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }
}
