//! The YAML config file
//!
//! ```yaml
//! site_dir: ./site-packages
//! src_dir: ./src
//! find_links:
//!   - ./wheelhouse
//! constraints:
//!   - ./constraints.txt
//! http_timeout_secs: 60
//! hash_archives: true
//! jobs: 4
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, config};

pub const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_root: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub find_links: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_archives: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

impl FileConfig {
    /// Parse a config file from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(Self::parse(yaml)?)
    }

    fn parse(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    /// Read and parse a config file, resolving its relative paths
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path)
            .map_err(|e| config::read_failed(path.display().to_string(), e.to_string()))?;
        let mut loaded = Self::parse(&yaml)
            .map_err(|e| config::parse_failed(path.display().to_string(), e.to_string()))?;

        if let Some(base) = path.parent() {
            loaded.rebase(base);
        }
        debug!(path = %path.display(), "loaded config file");
        Ok(loaded)
    }

    /// Load the explicit file if given, else the default file if it exists
    ///
    /// An explicit file that cannot be read is an error; a missing default
    /// file is not.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    fn rebase(&mut self, base: &Path) {
        let join = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        self.site_dir.iter_mut().for_each(join);
        self.src_dir.iter_mut().for_each(join);
        self.staging_root.iter_mut().for_each(join);
        self.find_links.iter_mut().for_each(join);
        self.constraints.iter_mut().for_each(join);
    }
}

/// `~/.config/sourcemark/config.yaml` (platform config dir)
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(env!("CARGO_PKG_NAME")).join(CONFIG_FILE_NAME))
}
