//! Archive retrieval
//!
//! The [`Fetcher`] turns a direct archive URL into a source tree on disk:
//! - `file://` URLs are read in place (directories are staged by copy)
//! - `http://` and `https://` URLs are streamed into the staging directory
//!
//! ## Module Organization
//!
//! - `http.rs`: Blocking HTTP download with a progress bar
//! - `unpack.rs`: tar/tar.gz/zip/wheel extraction

pub mod http;
pub mod unpack;

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::common::fs::{CopyOptions, copy_dir_recursive};
use crate::error::{Result, SourcemarkError, fetch};
use crate::hash::{self, ArchiveHash};
use crate::link;
use crate::source::DirectArchive;

pub use http::HttpClient;

/// Where a fetched source landed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub local_path: PathBuf,
    /// Content hash of the archive, when computed
    pub content_hash: Option<ArchiveHash>,
    /// The URL named a directory rather than an archive
    pub is_dir: bool,
}

/// Retrieves direct archives into a staging directory
#[derive(Debug, Clone)]
pub struct Fetcher {
    http: HttpClient,
    hash_archives: bool,
}

impl Fetcher {
    pub fn new(timeout: Option<Duration>, hash_archives: bool) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(timeout)?,
            hash_archives,
        })
    }

    /// Retrieve `archive` and verify any pinned hash
    pub fn fetch(&self, archive: &DirectArchive, staging: &Path) -> Result<FetchOutcome> {
        let url = archive.url.as_str();
        let outcome = match link::scheme(url) {
            Some("file") => self.fetch_local(url, staging)?,
            Some("http" | "https") => self.fetch_remote(url, staging)?,
            Some(other) => return Err(fetch::unsupported_scheme(other, url)),
            None => return Err(fetch::unsupported_scheme("", url)),
        };

        if outcome.is_dir {
            return Ok(outcome);
        }
        self.check_hash(archive, outcome)
    }

    fn fetch_local(&self, url: &str, staging: &Path) -> Result<FetchOutcome> {
        let path = link::url_to_path(url)?;
        if !path.exists() {
            return Err(fetch::failed(url, "no such file or directory"));
        }

        if path.is_dir() {
            let staged = staging.join("source");
            let copied = copy_dir_recursive(&path, &staged, &CopyOptions::exclude_vcs())
                .map_err(|e| fetch::failed(url, format!("failed to stage directory: {e}")))?;
            debug!(url, files = copied, "staged local directory");
            return Ok(FetchOutcome {
                local_path: staged,
                content_hash: None,
                is_dir: true,
            });
        }

        debug!(url, "reading local archive in place");
        Ok(FetchOutcome {
            local_path: path,
            content_hash: None,
            is_dir: false,
        })
    }

    fn fetch_remote(&self, url: &str, staging: &Path) -> Result<FetchOutcome> {
        let file_name = link::file_name(url)
            .filter(|name| link::archive_suffix(name).is_some())
            .ok_or_else(|| fetch::unsupported_archive(url))?;
        let dest = staging.join(file_name);
        self.http.download(url, &dest)?;
        Ok(FetchOutcome {
            local_path: dest,
            content_hash: None,
            is_dir: false,
        })
    }

    fn check_hash(&self, archive: &DirectArchive, mut outcome: FetchOutcome) -> Result<FetchOutcome> {
        if !self.hash_archives && archive.expected_hash.is_none() {
            return Ok(outcome);
        }

        let actual = hash::hash_file(&outcome.local_path)?;
        if let Some(expected) = &archive.expected_hash {
            if !hash::verify_hash(expected, &actual) {
                return Err(SourcemarkError::HashMismatch {
                    url: archive.url.clone(),
                    expected: expected.clone(),
                    actual: actual.to_string(),
                });
            }
        }

        info!(url = %archive.url, hash = %actual, "fetch complete");
        outcome.content_hash = Some(actual);
        Ok(outcome)
    }

    /// Source tree root of a fetched outcome, unpacking archives into `staging`
    pub fn source_tree(&self, outcome: &FetchOutcome, staging: &Path) -> Result<PathBuf> {
        if outcome.is_dir {
            return Ok(outcome.local_path.clone());
        }
        unpack::unpack(&outcome.local_path, &staging.join("unpacked"))
    }
}
