//! File system operations shared by the component installers

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::Result;

/// Copy the contents of `src` into `dst` recursively, creating `dst` if
/// needed. Returns the number of files copied.
pub fn copy_dir_recursive<P1, P2>(src: P1, dst: P2) -> Result<usize>
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
{
    let src_ref = src.as_ref();
    let dst_ref = dst.as_ref();

    if !dst_ref.exists() {
        fs::create_dir_all(dst_ref)?;
    }

    let mut copied = 0;
    for entry in fs::read_dir(src_ref)? {
        let entry = entry?;
        let entry_path = entry.path();
        let dst_path = dst_ref.join(entry.file_name());

        if entry_path.is_dir() {
            copied += copy_dir_recursive(&entry_path, &dst_path)?;
        } else {
            fs::copy(&entry_path, &dst_path)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Delete `dir` and everything below it. Returns whether anything was removed.
pub fn remove_dir_if_exists(dir: &Path) -> Result<bool> {
    if !dir.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(dir)?;
    debug!("Removed {}", dir.display());
    Ok(true)
}
