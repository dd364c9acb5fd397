//! SHA-256 hashing utilities for artifact integrity

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{ProvisionError, Result};

/// Calculate the SHA-256 hash of a file as lowercase hex
pub fn hash_file(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(|e| io_error(path, e))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Read the expected hash out of a sidecar file.
///
/// Accepts both a bare digest and the `<digest>  <filename>` form written by
/// `sha256sum`. The digest is lowercased.
pub fn read_sidecar(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    Ok(parse_sidecar(&content))
}

fn parse_sidecar(content: &str) -> String {
    content
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Verify a hash matches the expected value
pub fn verify_hash(expected: &str, actual: &str) -> bool {
    !expected.is_empty() && expected.eq_ignore_ascii_case(actual)
}

fn io_error(path: &Path, err: std::io::Error) -> ProvisionError {
    ProvisionError::Io {
        message: format!("{}: {}", path.display(), err),
    }
}
