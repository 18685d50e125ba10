//! Installing a source tree into the site directory
//!
//! There is no build backend: the tree (or its subdirectory) is copied into
//! `site_dir` as is, minus VCS metadata and top-level packaging files, and a
//! dist-info directory is written next to it.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::common::fs::VCS_DIRS;
use crate::error::{Result, SourcemarkError, fetch};
use crate::metadata::{
    self, PKG_INFO_FILE, PYPROJECT_FILE, ProjectMetadata, egg_link, find_installed,
    write_dist_info,
};
use crate::source::name;
use crate::transaction::Transaction;

/// Version recorded when a tree declares none
pub const FALLBACK_VERSION: &str = "0";

/// Top-level files describing how to build the project, never installed
const PACKAGING_FILES: &[&str] = &[
    PKG_INFO_FILE,
    PYPROJECT_FILE,
    "setup.py",
    "setup.cfg",
    "MANIFEST.in",
];

/// Top-level directory suffixes of build metadata, never installed
const METADATA_DIR_SUFFIXES: &[&str] = &[metadata::dist_info::DIST_INFO_SUFFIX, ".egg-info"];

/// What a successful build left in the site directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltDistribution {
    pub metadata: ProjectMetadata,
    pub dist_info: PathBuf,
    /// Package files copied, not counting metadata
    pub files: usize,
    /// Version of the distribution this one replaced
    pub replaced: Option<String>,
}

/// The directory holding the project: `tree` or its `subdirectory`
pub fn project_root(tree: &Path, subdirectory: Option<&str>, origin: &str) -> Result<PathBuf> {
    let Some(subdirectory) = subdirectory else {
        return Ok(tree.to_path_buf());
    };
    let root = tree.join(subdirectory);
    if root.is_dir() {
        Ok(root)
    } else {
        Err(fetch::failed(
            origin,
            format!("subdirectory '{subdirectory}' not found in the source tree"),
        ))
    }
}

/// Name and version to install `root` as
///
/// The declared name must agree with the requested one when both exist.
/// Without a declared name the requested name is used, then `fallback`.
pub fn resolve_metadata(
    root: &Path,
    requested: Option<&str>,
    fallback: &str,
) -> Result<ProjectMetadata> {
    let discovered = metadata::discover(root)?;

    if let (Some(requested), Some(found)) = (requested, discovered.name.as_deref()) {
        if !name::same(requested, found) {
            return Err(SourcemarkError::MetadataMismatch {
                expected: requested.to_string(),
                found: found.to_string(),
            });
        }
    }

    let project = discovered
        .name
        .or_else(|| requested.map(str::to_string))
        .unwrap_or_else(|| fallback.to_string());
    let version = discovered
        .version
        .unwrap_or_else(|| FALLBACK_VERSION.to_string());
    Ok(ProjectMetadata {
        name: project,
        version,
    })
}

/// Remove any installed distribution or editable link named `project`
///
/// Removed files are backed up in `transaction`. Returns the replaced
/// version, `Some("editable")` for a link.
pub fn replace_existing(
    site_dir: &Path,
    project: &str,
    transaction: &mut Transaction,
) -> Result<Option<String>> {
    let mut replaced = None;
    if let Some(existing) = find_installed(site_dir, project)? {
        let removed = existing.remove_files(transaction)?;
        info!(name = %existing.name, version = %existing.version, files = removed, "replacing installed distribution");
        replaced = Some(existing.version);
    }
    if let Some(link) = egg_link::find(site_dir, project)? {
        transaction.remove_file_with_backup(&link.link_file)?;
        info!(name = %link.name, "replacing editable install");
        replaced.get_or_insert_with(|| "editable".to_string());
    }
    Ok(replaced)
}

fn is_excluded(relative: &Path, is_dir: bool) -> bool {
    let Some(file_name) = relative.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if is_dir && VCS_DIRS.contains(&file_name) {
        return true;
    }
    if relative.components().count() != 1 {
        return false;
    }
    if is_dir {
        METADATA_DIR_SUFFIXES
            .iter()
            .any(|suffix| file_name.ends_with(suffix))
    } else {
        PACKAGING_FILES.contains(&file_name)
    }
}

/// Copy the project files under `root` into `site_dir`
///
/// Returns the copied paths relative to `site_dir`, `/`-separated and sorted.
/// Existing files are backed up before being overwritten. A rollback never
/// removes a copied file that another install has overwritten since.
pub fn copy_tree(root: &Path, site_dir: &Path, transaction: &mut Transaction) -> Result<Vec<String>> {
    transaction.create_dir_all(site_dir)?;

    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            !is_excluded(relative, entry.file_type().is_dir())
        });

    let mut copied = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| SourcemarkError::IoError {
            message: format!("Failed to read source tree {}: {e}", root.display()),
        })?;
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let dest = site_dir.join(relative);

        if entry.file_type().is_dir() {
            transaction.create_dir_all(&dest)?;
            continue;
        }
        if !entry.path().is_file() {
            debug!(path = %entry.path().display(), "skipping non-file entry");
            continue;
        }

        if dest.is_file() {
            transaction.remove_file_with_backup(&dest)?;
        }
        transaction.track_file_created(&dest);
        fs::copy(entry.path(), &dest).map_err(|e| SourcemarkError::IoError {
            message: format!(
                "Failed to copy {} to {}: {e}",
                entry.path().display(),
                dest.display()
            ),
        })?;
        transaction.track_file_written(&dest)?;
        copied.push(
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
        );
    }
    Ok(copied)
}

/// Install `root` as `project` into `site_dir`, replacing any older install
pub fn build(
    root: &Path,
    project: ProjectMetadata,
    site_dir: &Path,
    transaction: &mut Transaction,
) -> Result<BuiltDistribution> {
    let replaced = replace_existing(site_dir, &project.name, transaction)?;
    let files = copy_tree(root, site_dir, transaction)?;
    let dist_info = write_dist_info(site_dir, &project, &files, transaction)?;
    info!(
        name = %project.name,
        version = %project.version,
        files = files.len(),
        "metadata written"
    );

    Ok(BuiltDistribution {
        metadata: project,
        dist_info,
        files: files.len(),
        replaced,
    })
}
