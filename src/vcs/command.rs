//! Clients that shell out to the `hg`, `svn` and `bzr` executables
//!
//! Each client is available only when its executable is found on `PATH`.
//! Positional arguments always follow `--` so a URL can never be read as an
//! option.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use super::{CheckoutOutcome, VcsClient};
use crate::error::{Result, vcs};
use crate::source::VcsKind;

/// Run a VCS command and return its trimmed stdout
fn run(program: &Path, args: &[&str], cwd: Option<&Path>, url: &str) -> Result<String> {
    let mut command = Command::new(program);
    command.args(args);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }
    debug!(program = %program.display(), ?args, "running vcs command");

    let output = command
        .output()
        .map_err(|e| vcs::checkout_failed(url, format!("failed to run {}: {e}", program.display())))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(vcs::checkout_failed(url, stderr.trim().to_string()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn dest_str<'a>(dest: &'a Path, url: &str) -> Result<&'a str> {
    dest.to_str()
        .ok_or_else(|| vcs::checkout_failed(url, "destination path is not valid UTF-8"))
}

/// Executable lookup shared by the command clients
#[derive(Debug, Clone)]
struct Executable {
    name: &'static str,
    path: Option<PathBuf>,
}

impl Executable {
    fn find(name: &'static str) -> Self {
        Self {
            name,
            path: which::which(name).ok(),
        }
    }

    fn at(name: &'static str, path: PathBuf) -> Self {
        Self {
            name,
            path: Some(path),
        }
    }

    fn path(&self) -> Result<&Path> {
        self.path.as_deref().ok_or_else(|| vcs::not_found(self.name))
    }
}

/// Mercurial client
#[derive(Debug, Clone)]
pub struct Mercurial {
    exe: Executable,
}

impl Mercurial {
    pub fn new() -> Self {
        Self {
            exe: Executable::find("hg"),
        }
    }

    /// Use a specific `hg` executable
    pub fn with_executable(path: PathBuf) -> Self {
        Self {
            exe: Executable::at("hg", path),
        }
    }
}

impl Default for Mercurial {
    fn default() -> Self {
        Self::new()
    }
}

impl VcsClient for Mercurial {
    fn kind(&self) -> VcsKind {
        VcsKind::Hg
    }

    fn is_available(&self) -> bool {
        self.exe.path.is_some()
    }

    fn validate_revision(&self, revision: &str) -> Result<()> {
        if revision.is_empty() || revision.chars().any(char::is_whitespace) {
            return Err(vcs::invalid_revision("hg", revision, "contains whitespace"));
        }
        if revision.starts_with(':') || revision.starts_with('-') {
            return Err(vcs::invalid_revision(
                "hg",
                revision,
                "must not start with ':' or '-'",
            ));
        }
        Ok(())
    }

    fn checkout(&self, url: &str, revision: Option<&str>, dest: &Path) -> Result<CheckoutOutcome> {
        let hg = self.exe.path()?;
        let dest_arg = dest_str(dest, url)?;

        let mut args = vec!["clone", "--noupdate", "--", url, dest_arg];
        run(hg, &args, None, url)?;

        args = vec!["update", "--clean", "--rev", revision.unwrap_or("default")];
        run(hg, &args, Some(dest), url)?;

        let commit_id = run(hg, &["log", "-r", ".", "--template", "{node}"], Some(dest), url)?;
        Ok(CheckoutOutcome { commit_id })
    }
}

/// Subversion client
#[derive(Debug, Clone)]
pub struct Subversion {
    exe: Executable,
}

impl Subversion {
    pub fn new() -> Self {
        Self {
            exe: Executable::find("svn"),
        }
    }

    /// Use a specific `svn` executable
    pub fn with_executable(path: PathBuf) -> Self {
        Self {
            exe: Executable::at("svn", path),
        }
    }
}

impl Default for Subversion {
    fn default() -> Self {
        Self::new()
    }
}

impl VcsClient for Subversion {
    fn kind(&self) -> VcsKind {
        VcsKind::Svn
    }

    fn is_available(&self) -> bool {
        self.exe.path.is_some()
    }

    fn validate_revision(&self, revision: &str) -> Result<()> {
        let is_number = revision.parse::<u64>().is_ok_and(|n| n > 0);
        let is_date = revision.len() > 2 && revision.starts_with('{') && revision.ends_with('}');
        if is_number || is_date || revision == "HEAD" {
            Ok(())
        } else {
            Err(vcs::invalid_revision(
                "svn",
                revision,
                "expected a positive revision number, HEAD or {DATE}",
            ))
        }
    }

    fn checkout(&self, url: &str, revision: Option<&str>, dest: &Path) -> Result<CheckoutOutcome> {
        let svn = self.exe.path()?;
        let dest_arg = dest_str(dest, url)?;
        let revision = revision.unwrap_or("HEAD");

        run(
            svn,
            &["checkout", "--quiet", "--non-interactive", "-r", revision, "--", url, dest_arg],
            None,
            url,
        )?;

        let commit_id = run(svn, &["info", "--show-item", "revision", "--", dest_arg], None, url)?;
        Ok(CheckoutOutcome { commit_id })
    }
}

/// Bazaar client
#[derive(Debug, Clone)]
pub struct Bazaar {
    exe: Executable,
}

impl Bazaar {
    pub fn new() -> Self {
        Self {
            exe: Executable::find("bzr"),
        }
    }

    /// Use a specific `bzr` executable
    pub fn with_executable(path: PathBuf) -> Self {
        Self {
            exe: Executable::at("bzr", path),
        }
    }
}

impl Default for Bazaar {
    fn default() -> Self {
        Self::new()
    }
}

impl VcsClient for Bazaar {
    fn kind(&self) -> VcsKind {
        VcsKind::Bzr
    }

    fn is_available(&self) -> bool {
        self.exe.path.is_some()
    }

    fn validate_revision(&self, revision: &str) -> Result<()> {
        let valid = revision.parse::<u64>().is_ok()
            || ["revno:", "tag:", "revid:"]
                .iter()
                .any(|prefix| revision.strip_prefix(prefix).is_some_and(|rest| !rest.is_empty()));
        if valid && !revision.chars().any(char::is_whitespace) {
            Ok(())
        } else {
            Err(vcs::invalid_revision(
                "bzr",
                revision,
                "expected a revno, or a revno:, tag: or revid: revision",
            ))
        }
    }

    fn checkout(&self, url: &str, revision: Option<&str>, dest: &Path) -> Result<CheckoutOutcome> {
        let bzr = self.exe.path()?;
        let dest_arg = dest_str(dest, url)?;

        let mut args = vec!["branch", "--quiet"];
        let revision_arg;
        if let Some(revision) = revision {
            revision_arg = format!("-r{revision}");
            args.push(&revision_arg);
        }
        args.extend(["--", url, dest_arg]);
        run(bzr, &args, None, url)?;

        // `--tree` reports the revision the working tree is at, as a revid
        let info = run(bzr, &["revision-info", "--tree"], Some(dest), url)?;
        let commit_id = info
            .split_whitespace()
            .last()
            .map(str::to_string)
            .ok_or_else(|| vcs::checkout_failed(url, "bzr revision-info printed nothing"))?;
        Ok(CheckoutOutcome { commit_id })
    }
}
