//! Sources after fetch or checkout

use crate::hash::ArchiveHash;

use super::SourceDescriptor;

/// A source descriptor together with what fetching or checking it out produced
///
/// The commit id of a VCS source is set once, when the checkout completes,
/// and can only be read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    descriptor: SourceDescriptor,
    commit_id: Option<String>,
    content_hash: Option<ArchiveHash>,
    is_dir: bool,
}

impl ResolvedSource {
    pub fn new(descriptor: SourceDescriptor) -> Self {
        Self {
            descriptor,
            commit_id: None,
            content_hash: None,
            is_dir: false,
        }
    }

    /// Attach the commit a VCS checkout resolved to
    pub fn with_checkout(mut self, commit_id: impl Into<String>) -> Self {
        if self.commit_id.is_none() {
            self.commit_id = Some(commit_id.into());
        }
        self
    }

    /// Attach what fetching an archive produced
    pub fn with_fetch(mut self, content_hash: Option<ArchiveHash>, is_dir: bool) -> Self {
        self.content_hash = content_hash;
        self.is_dir = is_dir;
        self
    }

    pub fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    pub fn commit_id(&self) -> Option<&str> {
        self.commit_id.as_deref()
    }

    pub fn content_hash(&self) -> Option<&ArchiveHash> {
        self.content_hash.as_ref()
    }

    /// The archive URL named a local directory
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }
}
