//! Artifact acquisition
//!
//! [`Fetcher::fetch`] transfers one object; [`Fetcher::fetch_and_verify`] is
//! the integrity gate for the installation archive. An [`Artifact`] can only
//! be extracted once its hash has matched the sidecar.
//!
//! Only the installation archive has a sidecar. Installers fetched with
//! [`Fetcher::fetch`] are used as downloaded.

pub mod archive;
pub mod blob;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

pub use blob::{BlobStore, HttpBlobStore};

use crate::error::artifact::{download_failed, integrity};
use crate::error::Result;
use crate::hash;

/// A remote object materialized in the workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bucket: String,
    pub remote_path: String,
    /// Object key of the hash sidecar, if the artifact has one
    pub hash_source: Option<String>,
    pub local_path: PathBuf,
    verified: bool,
}

impl Artifact {
    pub fn new(
        bucket: impl Into<String>,
        remote_path: impl Into<String>,
        hash_source: Option<String>,
        local_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            remote_path: remote_path.into(),
            hash_source,
            local_path: local_path.into(),
            verified: false,
        }
    }

    #[cfg(test)]
    pub fn is_verified(&self) -> bool {
        self.verified
    }

    /// Local path of the downloaded hash sidecar
    pub fn sidecar_path(&self) -> PathBuf {
        let mut name = self.local_path.file_name().unwrap_or_default().to_os_string();
        name.push(".sha256");
        self.local_path.with_file_name(name)
    }

    /// Compare the local file's hash against the downloaded sidecar
    pub fn verify(&mut self) -> Result<()> {
        let expected = hash::read_sidecar(&self.sidecar_path())?;
        let actual = hash::hash_file(&self.local_path)?;

        if !hash::verify_hash(&expected, &actual) {
            self.verified = false;
            return Err(integrity(&self.local_path, expected, actual));
        }

        self.verified = true;
        info!("Verified {} (sha256 {})", self.remote_path, actual);
        Ok(())
    }

    /// Extract into `dest`; refuses artifacts that have not been verified
    pub fn extract_to(&self, dest: &Path) -> Result<()> {
        if !self.verified {
            return Err(integrity(&self.local_path, "verified archive", "unverified"));
        }
        let entries = archive::extract_tar_gz(&self.local_path, dest)?;
        info!("Extracted {} entries to {}", entries, dest.display());
        Ok(())
    }
}

/// Transfers objects from a [`BlobStore`] into local paths
pub struct Fetcher<'s> {
    store: &'s dyn BlobStore,
}

impl<'s> Fetcher<'s> {
    pub fn new(store: &'s dyn BlobStore) -> Self {
        Self { store }
    }

    /// Replace `local_path` with the remote object.
    ///
    /// Any transport failure surfaces uniformly as a download error: after the
    /// attempt, the file is either present or the fetch failed.
    pub fn fetch(&self, bucket: &str, remote_path: &str, local_path: &Path) -> Result<()> {
        if local_path.exists() {
            std::fs::remove_file(local_path)?;
        }
        if let Some(parent) = local_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("Downloading s3://{}/{}", bucket, remote_path);
        let transfer = self.store.download(bucket, remote_path, local_path);
        if let Err(e) = &transfer {
            warn!("Transfer of {} failed: {}", remote_path, e);
        }

        if !local_path.is_file() {
            let cause = transfer.err().map(|e| e.to_string());
            return Err(download_failed(bucket, remote_path, local_path, cause));
        }
        Ok(())
    }

    /// Fetch an archive and its hash sidecar into `download_dir`, verify the
    /// archive, then extract it into `destination`.
    ///
    /// Nothing is written to `destination` unless the hashes match.
    pub fn fetch_and_verify(
        &self,
        bucket: &str,
        archive_path: &str,
        hash_sidecar_path: &str,
        download_dir: &Path,
        destination: &Path,
    ) -> Result<Artifact> {
        let file_name = archive_path.rsplit('/').next().unwrap_or(archive_path);
        let mut artifact = Artifact::new(
            bucket,
            archive_path,
            Some(hash_sidecar_path.to_string()),
            download_dir.join(file_name),
        );

        self.fetch(bucket, archive_path, &artifact.local_path)?;
        self.fetch(bucket, hash_sidecar_path, &artifact.sidecar_path())?;

        artifact.verify()?;
        artifact.extract_to(destination)?;
        Ok(artifact)
    }
}
