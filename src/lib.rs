//! Sourcemark - package installer core with direct URL provenance
//!
//! Installs packages from version control repositories, archives, local
//! directories and find-links directories into a site directory, and
//! records in `direct_url.json` exactly which source each direct install
//! came from.
//!
//! ```no_run
//! use sourcemark::config::InstallConfig;
//! use sourcemark::install::Installer;
//! use sourcemark::source::InstallTarget;
//!
//! # fn main() -> sourcemark::error::Result<()> {
//! let installer = Installer::new(InstallConfig::new("/tmp/site-packages"))?;
//! let target = InstallTarget::parse("git+https://host/repo@v1.0#egg=pkg")?;
//! let report = installer.install(&[target]);
//! report.ensure_success()?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod commands;
pub mod common;
pub mod config;
pub mod error;
pub mod fetch;
pub mod hash;
pub mod install;
pub mod link;
pub mod metadata;
pub mod progress;
pub mod record;
pub mod source;
pub mod temp;
pub mod transaction;
pub mod vcs;

#[cfg(test)]
pub(crate) mod test_fixtures;
