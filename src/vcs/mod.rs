//! VCS checkouts for install sources
//!
//! Each version control system is a [`VcsClient`] registered in a
//! [`VcsRegistry`]. The installer only talks to the registry, so supporting
//! another VCS means registering another client.
//!
//! - `git.rs`: libgit2-backed client (clone, resolve revision, detached checkout)
//! - `auth.rs`: credential callbacks for git remotes
//! - `command.rs`: clients that drive the `hg`, `svn` and `bzr` executables

pub mod auth;
pub mod command;
pub mod git;

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, vcs};
use crate::source::{VcsKind, VcsReference};

pub use command::{Bazaar, Mercurial, Subversion};
pub use git::GitClient;

/// Result of a successful checkout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutOutcome {
    /// Fully resolved, non-symbolic revision of the checked out tree
    pub commit_id: String,
}

/// A version control client able to materialize a revision of a repository
pub trait VcsClient: Send + Sync {
    /// The kind this client handles
    fn kind(&self) -> VcsKind;

    /// Whether the client can run on this machine
    fn is_available(&self) -> bool {
        true
    }

    /// Reject revisions that are malformed for this VCS
    fn validate_revision(&self, revision: &str) -> Result<()>;

    /// Check out `revision` (or the default branch) of `url` into the fresh directory `dest`
    fn checkout(&self, url: &str, revision: Option<&str>, dest: &Path) -> Result<CheckoutOutcome>;
}

/// Registered VCS clients, one per kind
pub struct VcsRegistry {
    clients: HashMap<VcsKind, Box<dyn VcsClient>>,
}

impl VcsRegistry {
    /// A registry without any clients
    pub fn empty() -> Self {
        Self {
            clients: HashMap::new(),
        }
    }

    /// A registry with the built-in clients for git, hg, svn and bzr
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(GitClient::new()));
        registry.register(Box::new(Mercurial::new()));
        registry.register(Box::new(Subversion::new()));
        registry.register(Box::new(Bazaar::new()));
        registry
    }

    /// Register a client, replacing any previous client of the same kind
    pub fn register(&mut self, client: Box<dyn VcsClient>) {
        self.clients.insert(client.kind(), client);
    }

    /// Look up an available client for a kind
    pub fn client(&self, kind: VcsKind) -> Result<&dyn VcsClient> {
        match self.clients.get(&kind) {
            Some(client) if client.is_available() => Ok(client.as_ref()),
            _ => Err(vcs::not_found(kind.as_str())),
        }
    }

    /// Check out a reference into `dest` and report the resolved commit
    pub fn checkout(&self, reference: &VcsReference, dest: &Path) -> Result<CheckoutOutcome> {
        let client = self.client(reference.vcs)?;
        if let Some(revision) = &reference.revision_spec {
            client.validate_revision(revision)?;
        }

        debug!(
            vcs = %reference.vcs,
            url = %reference.url,
            revision = reference.revision_spec.as_deref().unwrap_or("<default>"),
            dest = %dest.display(),
            "checking out"
        );

        let outcome = client.checkout(
            &reference.url,
            reference.revision_spec.as_deref(),
            dest,
        )?;

        info!(
            vcs = %reference.vcs,
            url = %reference.url,
            commit_id = %outcome.commit_id,
            "checkout resolved"
        );
        Ok(outcome)
    }
}

impl Default for VcsRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for VcsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.clients.keys().map(|k| k.as_str()).collect();
        kinds.sort_unstable();
        f.debug_struct("VcsRegistry").field("clients", &kinds).finish()
    }
}

/// Whether a revision looks like a full commit hash (40 or 64 hex digits)
pub fn is_full_hash(revision: &str) -> bool {
    matches!(revision.len(), 40 | 64) && revision.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourcemarkError;
    use std::sync::Mutex;

    struct FakeClient {
        available: bool,
        calls: Mutex<Vec<(String, Option<String>)>>,
    }

    impl VcsClient for FakeClient {
        fn kind(&self) -> VcsKind {
            VcsKind::Hg
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn validate_revision(&self, revision: &str) -> Result<()> {
            if revision.contains(' ') {
                return Err(vcs::invalid_revision("hg", revision, "contains whitespace"));
            }
            Ok(())
        }

        fn checkout(
            &self,
            url: &str,
            revision: Option<&str>,
            _dest: &Path,
        ) -> Result<CheckoutOutcome> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), revision.map(str::to_string)));
            Ok(CheckoutOutcome {
                commit_id: "f".repeat(40),
            })
        }
    }

    fn fake(available: bool) -> Box<FakeClient> {
        Box::new(FakeClient {
            available,
            calls: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn test_unregistered_kind_is_vcs_not_found() {
        let registry = VcsRegistry::empty();
        let reference = VcsReference::new(VcsKind::Bzr, "https://host/repo");
        let err = registry
            .checkout(&reference, Path::new("/unused"))
            .unwrap_err();
        assert!(matches!(err, SourcemarkError::VcsNotFound { ref vcs } if vcs == "bzr"));
    }

    #[test]
    fn test_unavailable_client_is_vcs_not_found() {
        let mut registry = VcsRegistry::empty();
        registry.register(fake(false));
        assert!(matches!(
            registry.client(VcsKind::Hg),
            Err(SourcemarkError::VcsNotFound { .. })
        ));
    }

    #[test]
    fn test_registered_client_is_used() {
        let mut registry = VcsRegistry::empty();
        registry.register(fake(true));
        let reference =
            VcsReference::new(VcsKind::Hg, "https://host/repo").with_revision("stable");
        let outcome = registry
            .checkout(&reference, Path::new("/unused"))
            .unwrap();
        assert_eq!(outcome.commit_id, "f".repeat(40));
    }

    #[test]
    fn test_revision_validated_before_checkout() {
        let mut registry = VcsRegistry::empty();
        registry.register(fake(true));
        let reference =
            VcsReference::new(VcsKind::Hg, "https://host/repo").with_revision("two words");
        let err = registry
            .checkout(&reference, Path::new("/unused"))
            .unwrap_err();
        assert!(matches!(err, SourcemarkError::InvalidRevision { .. }));
    }

    #[test]
    fn test_defaults_register_every_kind() {
        let registry = VcsRegistry::with_defaults();
        for kind in VcsKind::ALL {
            assert!(registry.clients.contains_key(&kind));
        }
        assert!(registry.client(VcsKind::Git).is_ok());
    }

    #[test]
    fn test_is_full_hash() {
        assert!(is_full_hash("5547fa909e83df8bd743d3978d6667497983a4b7"));
        assert!(!is_full_hash("5547fa9"));
        assert!(!is_full_hash("main"));
    }
}
