//! SHA-256 hashing for fetched archives and installed files

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

use crate::error::{Result, SourcemarkError};

/// Algorithm name used in `<algo>=<digest>` strings
pub const HASH_ALGORITHM: &str = "sha256";

/// Content hash of a fetched archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHash {
    pub algorithm: String,
    pub hex: String,
}

impl ArchiveHash {
    /// Parse `sha256=<hex>`
    pub fn parse(value: &str) -> Option<Self> {
        let (algorithm, hex) = value.split_once('=')?;
        if algorithm.is_empty() || hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self {
            algorithm: algorithm.to_ascii_lowercase(),
            hex: hex.to_ascii_lowercase(),
        })
    }
}

impl fmt::Display for ArchiveHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.algorithm, self.hex)
    }
}

fn digest_file(path: &Path) -> Result<(Vec<u8>, u64)> {
    let read_failed = |e: std::io::Error| SourcemarkError::IoError {
        message: format!("Failed to read {}: {}", path.display(), e),
    };

    let file = File::open(path).map_err(read_failed)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    let mut size = 0u64;

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(read_failed)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
        size += bytes_read as u64;
    }

    Ok((hasher.finalize().to_vec(), size))
}

/// Calculate the SHA-256 hash of a file
pub fn hash_file(path: &Path) -> Result<ArchiveHash> {
    let (digest, _) = digest_file(path)?;
    Ok(ArchiveHash {
        algorithm: HASH_ALGORITHM.to_string(),
        hex: hex::encode(digest),
    })
}

/// Hash and size of an installed file, in the form used by RECORD
/// (`sha256=<urlsafe-base64-nopad>`)
pub fn hash_file_for_record(path: &Path) -> Result<(String, u64)> {
    let (digest, size) = digest_file(path)?;
    Ok((
        format!("{HASH_ALGORITHM}={}", URL_SAFE_NO_PAD.encode(digest)),
        size,
    ))
}

/// Verify a hash matches the expected `<algo>=<hex>` value
pub fn verify_hash(expected: &str, actual: &ArchiveHash) -> bool {
    ArchiveHash::parse(expected).is_some_and(|expected| expected == *actual)
}
