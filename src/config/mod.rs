//! Installer configuration
//!
//! [`InstallConfig`] is passed explicitly to the installer. It is assembled
//! from layers, later ones winning:
//! 1. Built-in defaults
//! 2. The YAML config file (`--config`, `SOURCEMARK_CONFIG`, or
//!    `~/.config/sourcemark/config.yaml`)
//! 3. Environment (`SOURCEMARK_TARGET`) and command line flags
//!
//! List settings (`find_links`, `constraints`) accumulate across layers.

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::link::absolutize;

pub use file::FileConfig;

/// Everything an install run needs to know about its environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallConfig {
    /// Directory packages are installed into
    pub site_dir: PathBuf,
    /// Where editable VCS checkouts are made (`<src_dir>/<name>`)
    pub src_dir: PathBuf,
    /// Parent of the per-target staging directories
    pub staging_root: PathBuf,
    /// Flat directories of archives acting as a minimal index
    pub find_links: Vec<PathBuf>,
    /// Constraints files
    pub constraints: Vec<PathBuf>,
    /// `None` leaves HTTP requests without a timeout
    pub http_timeout: Option<Duration>,
    /// Compute archive hashes for provenance records
    pub hash_archives: bool,
    /// Parallel targets; `None` uses one per CPU
    pub jobs: Option<usize>,
}

impl InstallConfig {
    /// Defaults for installing into `site_dir`
    pub fn new(site_dir: impl Into<PathBuf>) -> Self {
        let site_dir = site_dir.into();
        Self {
            src_dir: default_src_dir(),
            site_dir,
            staging_root: crate::temp::default_staging_root(),
            find_links: Vec::new(),
            constraints: Vec::new(),
            http_timeout: None,
            hash_archives: true,
            jobs: None,
        }
    }

    /// Number of targets installed at once
    pub fn jobs(&self) -> usize {
        self.jobs.filter(|jobs| *jobs > 0).unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        })
    }

    /// Build the effective configuration from a file layer and overrides
    pub fn resolve(file: &FileConfig, overrides: ConfigOverrides) -> Result<Self> {
        let site_dir = match overrides.site_dir.or_else(|| file.site_dir.clone()) {
            Some(dir) => dir,
            None => default_site_dir(),
        };
        let mut config = Self::new(absolutize(&site_dir)?);

        if let Some(src_dir) = overrides.src_dir.or_else(|| file.src_dir.clone()) {
            config.src_dir = absolutize(&src_dir)?;
        }
        if let Some(staging_root) = file.staging_root.clone() {
            config.staging_root = absolutize(&staging_root)?;
        }

        config.find_links = file
            .find_links
            .iter()
            .chain(&overrides.find_links)
            .map(|dir| absolutize(dir))
            .collect::<Result<_>>()?;
        config.constraints = file
            .constraints
            .iter()
            .chain(&overrides.constraints)
            .map(|path| absolutize(path))
            .collect::<Result<_>>()?;

        config.http_timeout = overrides
            .http_timeout
            .or(file.http_timeout_secs.map(Duration::from_secs));
        config.hash_archives = !overrides.no_hash && file.hash_archives.unwrap_or(true);
        config.jobs = overrides.jobs.or(file.jobs);
        Ok(config)
    }
}

/// Settings given on the command line or through the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub site_dir: Option<PathBuf>,
    pub src_dir: Option<PathBuf>,
    pub find_links: Vec<PathBuf>,
    pub constraints: Vec<PathBuf>,
    pub http_timeout: Option<Duration>,
    pub no_hash: bool,
    pub jobs: Option<usize>,
}

/// `<data dir>/sourcemark/site-packages`
pub fn default_site_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(crate::temp::temp_dir_base)
        .join(env!("CARGO_PKG_NAME"))
        .join("site-packages")
}

/// `src` under the current directory
fn default_src_dir() -> PathBuf {
    absolutize(Path::new("src")).unwrap_or_else(|_| crate::temp::temp_dir_base().join("src"))
}
