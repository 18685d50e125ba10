//! Persisting `direct_url.json`

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use super::DirectUrl;
use crate::common::fs::write_atomic;
use crate::error::{Result, metadata};
use crate::metadata::dist_info::append_record;

pub const DIRECT_URL_FILE: &str = "direct_url.json";

/// Writes record bytes to their final location
///
/// Implementations must leave no file at `path` when they fail.
pub trait DirectUrlWriter: Send + Sync {
    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()>;
}

/// Temp file in the same directory, fsync, rename
#[derive(Debug, Default, Clone, Copy)]
pub struct AtomicFileWriter;

impl DirectUrlWriter for AtomicFileWriter {
    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        write_atomic(path, content)
    }
}

/// Persist a record into `dist_info` and list it in RECORD
pub fn write_direct_url(
    dist_info: &Path,
    direct_url: &DirectUrl,
    writer: &dyn DirectUrlWriter,
) -> Result<PathBuf> {
    let path = dist_info.join(DIRECT_URL_FILE);
    let json = direct_url.to_json()?;

    writer
        .write(&path, json.as_bytes())
        .map_err(|e| metadata::record_write_failed(path.display().to_string(), e.to_string()))?;

    if let Err(e) = append_record(dist_info, DIRECT_URL_FILE) {
        let _ = fs::remove_file(&path);
        return Err(metadata::record_write_failed(
            path.display().to_string(),
            e.to_string(),
        ));
    }

    info!(path = %path.display(), kind = direct_url.kind_label(), url = %direct_url.url, "record written");
    Ok(path)
}

/// Read the record of a dist-info directory, if it has one
pub fn read_direct_url(dist_info: &Path) -> Result<Option<DirectUrl>> {
    let path = dist_info.join(DIRECT_URL_FILE);
    match fs::read_to_string(&path) {
        Ok(json) => DirectUrl::from_json(&json)
            .map(Some)
            .map_err(|e| metadata::read_failed(path.display().to_string(), e.to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(metadata::read_failed(path.display().to_string(), e.to_string())),
    }
}
