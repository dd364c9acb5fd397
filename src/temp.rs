//! Per-run scratch workspace under the system temp root.
//!
//! Temp dirs are never created under the current working directory (e.g. when
//! TMPDIR=tmp or TMPDIR=./tmp).

use std::env;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::error::Result;

/// Prefix of every workspace directory name
const WORKSPACE_PREFIX: &str = "fleet-bootstrap-";

/// Downloaded objects (archives, sidecars, installers)
const DOWNLOADS_DIR: &str = "downloads";

/// Extraction target for the verified artifact archive
const ARTIFACTS_DIR: &str = "artifacts";

/// Returns a directory path suitable for creating temporary directories.
/// Never returns a relative path, so temp dirs are never created under the current working
/// directory.
pub fn temp_dir_base() -> PathBuf {
    let t = env::temp_dir();
    if t.is_absolute() {
        t
    } else {
        #[cfg(windows)]
        {
            env::var("TEMP")
                .or_else(|_| env::var("TMP"))
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("C:\\Windows\\Temp"))
        }
        #[cfg(not(windows))]
        {
            PathBuf::from("/tmp")
        }
    }
}

/// Ephemeral directory exclusively owned by one run.
///
/// Removed by [`TempWorkspace::close`]; dropping an unclosed workspace removes
/// it as well, so the directory never outlives the process on any exit path.
#[derive(Debug)]
pub struct TempWorkspace {
    dir: TempDir,
}

impl TempWorkspace {
    /// Create a uniquely named workspace under the system temp root
    pub fn create() -> Result<Self> {
        Self::create_in(&temp_dir_base())
    }

    /// Create a uniquely named workspace under `base`
    pub fn create_in(base: &Path) -> Result<Self> {
        std::fs::create_dir_all(base)?;
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(base)?;
        std::fs::create_dir(dir.path().join(DOWNLOADS_DIR))?;
        debug!("Created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.dir.path().join(DOWNLOADS_DIR)
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.dir.path().join(ARTIFACTS_DIR)
    }

    /// Remove the workspace, reporting any failure to do so
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!("Removed workspace {}", path.display());
        Ok(())
    }
}
