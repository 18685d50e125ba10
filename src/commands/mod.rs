//! Command implementations for the Sourcemark CLI

pub mod completions;
pub mod install;
pub mod list;
pub mod show;
pub mod uninstall;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{ConfigOverrides, FileConfig, InstallConfig};
use crate::error::Result;

/// Options shared by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub site_dir: Option<PathBuf>,
}

impl GlobalOptions {
    /// Effective configuration: config file, then environment and flags
    pub fn resolve(&self, mut overrides: ConfigOverrides) -> Result<InstallConfig> {
        let file = FileConfig::discover(self.config.as_deref())?;
        if overrides.site_dir.is_none() {
            overrides.site_dir.clone_from(&self.site_dir);
        }
        let config = InstallConfig::resolve(&file, overrides)?;
        debug!(?config, "resolved configuration");
        Ok(config)
    }

    /// Site directory for commands that only read or remove installs
    pub fn site_dir(&self) -> Result<PathBuf> {
        Ok(self.resolve(ConfigOverrides::default())?.site_dir)
    }
}

pub(crate) fn display_path(path: &Path) -> String {
    dunce::simplified(path).display().to_string()
}
