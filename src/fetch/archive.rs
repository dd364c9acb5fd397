//! Gzip-compressed tar archives

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tar::{Archive, Builder};
use tracing::debug;

use crate::error::{ProvisionError, Result};

/// Extract `archive` into `dest`, creating `dest` if needed.
///
/// Ownership is not preserved; an entry that would land outside `dest` aborts
/// the extraction.
pub fn extract_tar_gz(archive: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(archive)?;
    let mut tar = Archive::new(GzDecoder::new(file));
    tar.set_preserve_ownerships(false);

    fs::create_dir_all(dest)?;

    let mut count = 0;
    for entry in tar.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.to_path_buf();
        if !entry.unpack_in(dest)? {
            return Err(ProvisionError::Io {
                message: format!(
                    "archive entry {} escapes {}",
                    path.display(),
                    dest.display()
                ),
            });
        }
        count += 1;
    }

    debug!(
        "Extracted {} entries from {} into {}",
        count,
        archive.display(),
        dest.display()
    );
    Ok(count)
}

/// Pack the contents of `src_dir` into a new archive at `archive`
pub fn pack_tar_gz(src_dir: &Path, archive: &Path) -> Result<()> {
    let file = File::create(archive)?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut builder = Builder::new(encoder);
    builder.follow_symlinks(false);
    builder.append_dir_all(".", src_dir)?;
    builder.into_inner()?.finish()?.flush()?;
    debug!("Packed {} into {}", src_dir.display(), archive.display());
    Ok(())
}
