//! Remote blob storage access

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::config::RemoteLayout;
use crate::error::Result;
use crate::error::component::host_failed;
use crate::progress::DownloadProgress;

/// Connect timeout for object transfers; transfers themselves are unbounded
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of remote objects
pub trait BlobStore {
    /// Transfer `bucket/key` to `dest`.
    ///
    /// Implementations must not leave a partial file at `dest` on failure.
    fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<()>;
}

/// Blob store reached over HTTPS using the layout's URL template
pub struct HttpBlobStore {
    client: reqwest::blocking::Client,
    region: String,
    remote: RemoteLayout,
}

impl HttpBlobStore {
    pub fn new(region: impl Into<String>, remote: RemoteLayout) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(None)
            .user_agent(concat!("fleet-bootstrap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| host_failed("create HTTP client", e.to_string()))?;

        Ok(Self {
            client,
            region: region.into(),
            remote,
        })
    }
}

impl BlobStore for HttpBlobStore {
    fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<()> {
        let url = self.remote.object_url(bucket, &self.region, key);
        let operation = format!("GET {url}");
        debug!("{}", operation);

        let mut response = self
            .client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| host_failed(&operation, e.to_string()))?;

        let part = part_path(dest);
        let progress = DownloadProgress::new(key, response.content_length());
        let copied = copy_to_file(&mut response, &part, &progress);

        match copied {
            Ok(bytes) => {
                progress.finish();
                fs::rename(&part, dest)?;
                debug!("Downloaded {} bytes to {}", bytes, dest.display());
                Ok(())
            }
            Err(e) => {
                progress.abandon();
                let _ = fs::remove_file(&part);
                Err(host_failed(operation, e.to_string()))
            }
        }
    }
}

/// Sibling of `dest` the transfer is staged in
fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

fn copy_to_file(
    reader: &mut impl Read,
    path: &Path,
    progress: &DownloadProgress,
) -> std::io::Result<u64> {
    let mut writer = BufWriter::new(File::create(path)?);
    let mut buffer = [0u8; 64 * 1024];
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buffer[..n])?;
        total += n as u64;
        progress.advance(n as u64);
    }

    writer.flush()?;
    Ok(total)
}
