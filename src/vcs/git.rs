//! Git checkouts through libgit2
//!
//! A requested revision (branch, tag, full or abbreviated hash) is resolved
//! after cloning and checked out as a detached HEAD. The resolved commit is
//! always reported as a full SHA, never as the symbolic name.

use std::borrow::Cow;
use std::path::Path;

use git2::{ErrorClass, FetchOptions, RemoteCallbacks, Repository, build::RepoBuilder};
use tracing::debug;

use super::auth::setup_auth_callbacks;
use super::{CheckoutOutcome, VcsClient};
use crate::error::{Result, vcs};
use crate::source::VcsKind;

/// Git client backed by libgit2
#[derive(Debug, Default, Clone, Copy)]
pub struct GitClient;

impl GitClient {
    pub fn new() -> Self {
        Self
    }
}

impl VcsClient for GitClient {
    fn kind(&self) -> VcsKind {
        VcsKind::Git
    }

    fn validate_revision(&self, revision: &str) -> Result<()> {
        validate_refname(revision)
            .map_err(|reason| vcs::invalid_revision("git", revision, reason))
    }

    fn checkout(&self, url: &str, revision: Option<&str>, dest: &Path) -> Result<CheckoutOutcome> {
        // Tags and arbitrary commits are unreachable from a depth=1 clone
        let repo = clone(url, dest, revision.is_none())?;

        let commit_id = match revision {
            Some(rev) => {
                let sha = match resolve_ref(&repo, Some(rev)) {
                    Ok(sha) => sha,
                    Err(_) if super::is_full_hash(rev) => {
                        fetch_commit(&repo, url, rev)?;
                        resolve_ref(&repo, Some(rev))?
                    }
                    Err(_) => {
                        return Err(vcs::checkout_failed(
                            url,
                            format!("revision '{rev}' not found"),
                        ));
                    }
                };
                checkout_commit(&repo, url, &sha)?;
                sha
            }
            None => resolve_ref(&repo, None)?,
        };

        Ok(CheckoutOutcome { commit_id })
    }
}

/// Check a revision against git's refname rules, allowing bare hashes
fn validate_refname(revision: &str) -> std::result::Result<(), &'static str> {
    if revision.is_empty() {
        return Err("empty revision");
    }
    if revision.starts_with('-') {
        return Err("must not start with '-'");
    }
    if revision.starts_with('/') || revision.ends_with('/') || revision.contains("//") {
        return Err("misplaced '/'");
    }
    if revision.contains("..") {
        return Err("contains '..'");
    }
    if revision.contains("@{") || revision == "@" {
        return Err("contains '@{'");
    }
    if revision.ends_with('.') || revision.ends_with(".lock") {
        return Err("must not end with '.' or '.lock'");
    }
    if revision
        .chars()
        .any(|c| c.is_ascii_control() || c.is_whitespace() || "~^:?*[\\".contains(c))
    {
        return Err("contains a character git does not allow in ref names");
    }
    if revision.split('/').any(|part| part.starts_with('.')) {
        return Err("path component starts with '.'");
    }
    Ok(())
}

/// Normalize SSH URLs from SCP-style (git@host:path) to ssh:// format.
fn normalize_ssh_url_for_clone(url: &str) -> Cow<'_, str> {
    if !url.starts_with("git@") {
        return Cow::Borrowed(url);
    }

    match url.split_once(':') {
        Some((host, path)) => {
            let path = path.strip_prefix('/').unwrap_or(path);
            Cow::Owned(format!("ssh://{host}/{path}"))
        }
        None => Cow::Borrowed(url),
    }
}

/// Normalize file:// URLs so libgit2 can resolve them.
fn normalize_file_url_for_clone(url: &str) -> Cow<'_, str> {
    let Some(after) = url.strip_prefix("file://") else {
        return Cow::Borrowed(url);
    };
    if after.contains('\\') {
        return Cow::Owned(format!(
            "file:///{}",
            after.replace('\\', "/").trim_start_matches('/')
        ));
    }
    if !after.is_empty() && !after.starts_with('/') {
        return Cow::Owned(format!("file:///{after}"));
    }
    Cow::Borrowed(url)
}

fn is_local(url: &str) -> bool {
    url.starts_with("file://") || Path::new(url).is_absolute()
}

/// Interpret a git2 error and provide a more user-friendly message
fn interpret_git_error(err: &git2::Error) -> String {
    let class = err.class();
    let message = err.message().to_lowercase();

    if message.contains("not found")
        || message.contains("404")
        || message.contains("too many redirects")
        || message.contains("authentication replays")
    {
        "repository not found".to_string()
    } else if message.contains("authentication") || message.contains("credentials") {
        "authentication failed".to_string()
    } else if message.contains("permission denied") || message.contains("access denied") {
        "permission denied".to_string()
    } else if message.contains("connection")
        || message.contains("network")
        || message.contains("timeout")
        || message.contains("timed out")
    {
        format!("network error: {}", err.message())
    } else if class == ErrorClass::Http {
        format!("HTTP error: {}", err.message())
    } else if class == ErrorClass::Ssh {
        format!("SSH error: {}", err.message())
    } else {
        err.message().to_string()
    }
}

fn fetch_options<'a>(shallow: bool) -> FetchOptions<'a> {
    let mut callbacks = RemoteCallbacks::new();
    setup_auth_callbacks(&mut callbacks);

    let mut options = FetchOptions::new();
    options.remote_callbacks(callbacks);
    if shallow {
        options.depth(1);
    }
    options
}

/// Clone a git repository into `target`
///
/// `shallow` only applies to remote URLs; local clones are always full.
pub fn clone(url: &str, target: &Path, shallow: bool) -> Result<Repository> {
    let shallow = shallow && !is_local(url);

    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_options(shallow));

    let url_to_clone = normalize_ssh_url_for_clone(url);
    let url_to_clone = normalize_file_url_for_clone(&url_to_clone);
    debug!(url = %url_to_clone, shallow, "cloning");

    builder
        .clone(url_to_clone.as_ref(), target)
        .map_err(|e| vcs::checkout_failed(url, interpret_git_error(&e)))
}

/// Fetch a single commit that no advertised ref points at
fn fetch_commit(repo: &Repository, url: &str, sha: &str) -> Result<()> {
    debug!(sha, "commit not reachable from refs, fetching it directly");
    let mut remote = repo
        .find_remote("origin")
        .map_err(|e| vcs::checkout_failed(url, e.message()))?;
    remote
        .fetch(&[sha], Some(&mut fetch_options(false)), None)
        .map_err(|e| vcs::checkout_failed(url, interpret_git_error(&e)))
}

/// Resolve a git ref (branch, tag, or SHA) to a full SHA, HEAD if none is given
pub fn resolve_ref(repo: &Repository, git_ref: Option<&str>) -> Result<String> {
    let commit = match git_ref {
        Some(r) => resolve_reference(repo, r)?,
        None => repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(|e| vcs::checkout_failed(origin_url(repo), e.message()))?,
    };

    Ok(commit.id().to_string())
}

fn origin_url(repo: &Repository) -> String {
    repo.find_remote("origin")
        .ok()
        .and_then(|remote| remote.url().map(str::to_string))
        .unwrap_or_else(|| repo.path().display().to_string())
}

/// Resolve a reference name to a commit
fn resolve_reference<'a>(repo: &'a Repository, refname: &str) -> Result<git2::Commit<'a>> {
    let ref_candidates = [
        format!("refs/remotes/origin/{refname}"),
        format!("refs/tags/{refname}"),
        format!("refs/heads/{refname}"),
        refname.to_string(),
    ];

    for candidate in &ref_candidates {
        if let Ok(reference) = repo.find_reference(candidate) {
            if let Ok(commit) = reference.peel_to_commit() {
                return Ok(commit);
            }
        }
    }

    if let Ok(oid) = git2::Oid::from_str(refname) {
        if let Ok(commit) = repo.find_commit(oid) {
            return Ok(commit);
        }
    }

    if let Ok(commit) = repo
        .revparse_single(refname)
        .and_then(|obj| obj.peel_to_commit())
    {
        return Ok(commit);
    }

    Err(vcs::checkout_failed(
        origin_url(repo),
        format!("revision '{refname}' not found"),
    ))
}

/// Check out a commit as a detached HEAD, forcing the working tree to match
pub fn checkout_commit(repo: &Repository, url: &str, sha: &str) -> Result<()> {
    let failed = |e: git2::Error| vcs::checkout_failed(url, format!("{sha}: {}", e.message()));

    let oid = git2::Oid::from_str(sha).map_err(failed)?;
    let commit = repo.find_commit(oid).map_err(failed)?;
    repo.set_head_detached(commit.id()).map_err(failed)?;

    let mut checkout_builder = git2::build::CheckoutBuilder::new();
    checkout_builder.force();
    repo.checkout_head(Some(&mut checkout_builder))
        .map_err(failed)
}
