//! Direct URL provenance records
//!
//! A `direct_url.json` in a dist-info directory records how a distribution
//! that did not come from an index was obtained. Its JSON shape follows
//! PEP 610: `url` at the top level, exactly one of `vcs_info`,
//! `archive_info` or `dir_info`, and an optional `subdirectory`.
//!
//! ```json
//! {"url": "file:///tmp/pkg", "vcs_info": {"vcs": "git", "commit_id": "5547fa9...", "requested_revision": "v1.0"}}
//! ```
//!
//! Index requirements and editable installs never get a record.

pub mod writer;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SourcemarkError};
use crate::hash::ArchiveHash;
use crate::source::{ResolvedSource, SourceDescriptor, VcsKind};

pub use writer::{
    AtomicFileWriter, DIRECT_URL_FILE, DirectUrlWriter, read_direct_url, write_direct_url,
};

/// Persisted provenance of a direct install
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectUrl {
    pub url: String,
    #[serde(flatten)]
    pub info: DirectUrlInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdirectory: Option<String>,
}

/// Which kind of source a record describes; the JSON key is the discriminant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectUrlInfo {
    #[serde(rename = "vcs_info")]
    Vcs(VcsInfo),
    #[serde(rename = "archive_info")]
    Archive(ArchiveInfo),
    #[serde(rename = "dir_info")]
    Dir(DirInfo),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsInfo {
    pub vcs: VcsKind,
    /// Fully resolved revision, never a branch or tag name
    pub commit_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_revision: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveInfo {
    /// `<algo>=<hex>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashes: Option<BTreeMap<String, String>>,
}

impl ArchiveInfo {
    pub fn from_hash(hash: Option<&ArchiveHash>) -> Self {
        match hash {
            Some(hash) => Self {
                hash: Some(hash.to_string()),
                hashes: Some(BTreeMap::from([(hash.algorithm.clone(), hash.hex.clone())])),
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirInfo {
    #[serde(default)]
    pub editable: bool,
}

impl DirectUrl {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SourcemarkError::IoError {
            message: format!("Failed to serialize direct URL record: {e}"),
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Into::into)
    }

    /// Short label for display: `vcs`, `archive` or `dir`
    pub fn kind_label(&self) -> &'static str {
        match self.info {
            DirectUrlInfo::Vcs(_) => "vcs",
            DirectUrlInfo::Archive(_) => "archive",
            DirectUrlInfo::Dir(_) => "dir",
        }
    }
}

/// Build the record for a resolved source, or `None` when it gets no record
///
/// Fails only if a VCS source reaches this point without a resolved commit.
pub fn build_direct_url(resolved: &ResolvedSource) -> Result<Option<DirectUrl>> {
    let direct_url = match resolved.descriptor() {
        SourceDescriptor::IndexRequirement(_) | SourceDescriptor::LocalEditable(_) => None,
        SourceDescriptor::VcsReference(reference) => {
            let commit_id = resolved.commit_id().ok_or_else(|| {
                SourcemarkError::InvalidStateTransition {
                    from: "Resolved".to_string(),
                    to: "ProvenanceRecorded".to_string(),
                }
            })?;
            Some(DirectUrl {
                url: reference.url.clone(),
                info: DirectUrlInfo::Vcs(VcsInfo {
                    vcs: reference.vcs,
                    commit_id: commit_id.to_string(),
                    requested_revision: reference.revision_spec.clone(),
                }),
                subdirectory: reference.subdirectory.clone(),
            })
        }
        SourceDescriptor::DirectArchive(archive) => {
            let info = if resolved.is_dir() {
                DirectUrlInfo::Dir(DirInfo { editable: false })
            } else {
                DirectUrlInfo::Archive(ArchiveInfo::from_hash(resolved.content_hash()))
            };
            Some(DirectUrl {
                url: archive.url.clone(),
                info,
                subdirectory: archive.subdirectory.clone(),
            })
        }
    };
    Ok(direct_url)
}
