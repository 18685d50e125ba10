//! Installed distributions in a site directory

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use super::dist_info::{self, DIST_INFO_SUFFIX, METADATA_FILE, RecordEntry};
use super::egg_link::{self, EggLink};
use super::parse_core_metadata;
use crate::error::{Result, SourcemarkError, metadata};
use crate::record::{self, DirectUrl};
use crate::source::name;
use crate::transaction::Transaction;

/// A distribution with a dist-info directory in the site directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledDistribution {
    pub name: String,
    pub version: String,
    pub dist_info: PathBuf,
}

impl InstalledDistribution {
    /// Load a distribution from its dist-info directory
    ///
    /// Name and version come from `METADATA`, falling back to the directory name.
    pub fn from_dist_info(dist_info: &Path) -> Result<Self> {
        let dir_name = dist_info
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = dir_name.strip_suffix(DIST_INFO_SUFFIX).unwrap_or(&dir_name);
        let (dir_project, dir_version) = stem.split_once('-').unwrap_or((stem, ""));

        let metadata_path = dist_info.join(METADATA_FILE);
        let declared = match fs::read_to_string(&metadata_path) {
            Ok(content) => parse_core_metadata(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Default::default(),
            Err(e) => {
                return Err(metadata::read_failed(
                    metadata_path.display().to_string(),
                    e.to_string(),
                ));
            }
        };

        Ok(Self {
            name: declared.name.unwrap_or_else(|| dir_project.to_string()),
            version: declared.version.unwrap_or_else(|| dir_version.to_string()),
            dist_info: dist_info.to_path_buf(),
        })
    }

    /// Site directory this distribution is installed into
    pub fn site_dir(&self) -> &Path {
        self.dist_info.parent().unwrap_or_else(|| Path::new("."))
    }

    /// The direct URL record, absent for index-installed distributions
    pub fn direct_url(&self) -> Result<Option<DirectUrl>> {
        record::read_direct_url(&self.dist_info)
    }

    pub fn record_entries(&self) -> Result<Vec<RecordEntry>> {
        dist_info::read_record(&self.dist_info)
    }

    /// Absolute paths of every file belonging to this distribution
    ///
    /// RECORD entries that would escape the site directory are ignored.
    /// Files in the dist-info directory are included even if RECORD misses them.
    pub fn installed_files(&self) -> Result<Vec<PathBuf>> {
        let site_dir = self.site_dir();
        let mut files = BTreeSet::new();

        let entries = if self.dist_info.join(dist_info::RECORD_FILE).exists() {
            self.record_entries()?
        } else {
            Vec::new()
        };
        for entry in entries {
            let relative = Path::new(&entry.path);
            let escapes = relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
            if escapes {
                debug!(path = %entry.path, "ignoring RECORD entry outside the site directory");
                continue;
            }
            files.insert(site_dir.join(relative));
        }

        for entry in walkdir::WalkDir::new(&self.dist_info) {
            let entry = entry.map_err(|e| {
                metadata::read_failed(self.dist_info.display().to_string(), e.to_string())
            })?;
            if entry.file_type().is_file() {
                files.insert(entry.into_path());
            }
        }

        Ok(files.into_iter().collect())
    }

    /// Remove every file of this distribution, backing each up in `transaction`
    ///
    /// Directories left empty are removed up to the site directory.
    pub fn remove_files(&self, transaction: &mut Transaction) -> Result<usize> {
        let site_dir = self.site_dir().to_path_buf();
        let mut removed = 0;
        let mut parents = BTreeSet::new();

        for file in self.installed_files()? {
            if !file.is_file() {
                continue;
            }
            transaction.remove_file_with_backup(&file)?;
            removed += 1;
            if let Some(parent) = file.parent() {
                parents.insert(parent.to_path_buf());
            }
        }

        // Deepest first
        let mut parents: Vec<_> = parents.into_iter().collect();
        parents.sort_by_key(|dir| std::cmp::Reverse(dir.components().count()));
        for dir in parents {
            prune_empty_dirs(&dir, &site_dir);
        }

        Ok(removed)
    }
}

fn prune_empty_dirs(start: &Path, stop: &Path) {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir == stop || !dir.starts_with(stop) {
            break;
        }
        let is_empty = fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_none());
        if !is_empty || fs::remove_dir(dir).is_err() {
            break;
        }
        current = dir.parent();
    }
}

/// All distributions installed in a site directory, sorted by name
pub fn list_installed(site_dir: &Path) -> Result<Vec<InstalledDistribution>> {
    if !site_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut installed = Vec::new();
    for entry in fs::read_dir(site_dir)? {
        let entry = entry?;
        let is_dist_info = entry
            .file_name()
            .to_string_lossy()
            .ends_with(DIST_INFO_SUFFIX);
        if is_dist_info && entry.file_type()?.is_dir() {
            installed.push(InstalledDistribution::from_dist_info(&entry.path())?);
        }
    }
    installed.sort_by(|a, b| name::canonicalize(&a.name).cmp(&name::canonicalize(&b.name)));
    Ok(installed)
}

/// The installed distribution with this name, if any
pub fn find_installed(site_dir: &Path, project: &str) -> Result<Option<InstalledDistribution>> {
    Ok(list_installed(site_dir)?
        .into_iter()
        .find(|dist| name::same(&dist.name, project)))
}

/// What `uninstall` removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallReport {
    pub name: String,
    /// `None` for editable installs
    pub version: Option<String>,
    pub removed_files: usize,
}

/// Remove an installed distribution or editable link
///
/// Either everything belonging to the distribution is removed or, on error,
/// nothing is.
pub fn uninstall(site_dir: &Path, project: &str) -> Result<UninstallReport> {
    let mut transaction = Transaction::new(format!("uninstall {project}"));

    let report = if let Some(dist) = find_installed(site_dir, project)? {
        let removed_files = dist.remove_files(&mut transaction)?;
        UninstallReport {
            name: dist.name,
            version: Some(dist.version),
            removed_files,
        }
    } else if let Some(link) = egg_link::find(site_dir, project)? {
        transaction.remove_file_with_backup(&link.link_file)?;
        let EggLink { name, .. } = link;
        UninstallReport {
            name,
            version: None,
            removed_files: 1,
        }
    } else {
        return Err(SourcemarkError::DistributionNotFound {
            name: project.to_string(),
        });
    };

    transaction.commit();
    info!(name = %report.name, files = report.removed_files, "uninstalled");
    Ok(report)
}
