//! Editable install links
//!
//! An editable install leaves `<name>.egg-link` in the site directory. The
//! first line is the absolute path of the source tree, the second is `.`.
//! Editable installs have no dist-info directory and no direct URL record.

use std::fs;
use std::path::{Path, PathBuf};

use crate::common::fs::write_atomic;
use crate::error::{Result, metadata};
use crate::source::name;
use crate::transaction::Transaction;

pub const EGG_LINK_SUFFIX: &str = ".egg-link";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EggLink {
    pub name: String,
    /// Source tree the install points at
    pub source: PathBuf,
    /// The `.egg-link` file itself
    pub link_file: PathBuf,
}

impl EggLink {
    /// Write `<name>.egg-link` pointing at `source`
    pub fn write(
        site_dir: &Path,
        project: &str,
        source: &Path,
        transaction: &mut Transaction,
    ) -> Result<Self> {
        transaction.create_dir_all(site_dir)?;
        let link_file = site_dir.join(format!("{project}{EGG_LINK_SUFFIX}"));
        transaction.track_file_created(&link_file);
        write_atomic(&link_file, format!("{}\n.\n", source.display()).as_bytes())
            .map_err(|e| metadata::write_failed(link_file.display().to_string(), e.to_string()))?;

        Ok(Self {
            name: project.to_string(),
            source: source.to_path_buf(),
            link_file,
        })
    }

    /// Read an `.egg-link` file
    pub fn read(link_file: &Path) -> Result<Self> {
        let content = fs::read_to_string(link_file)
            .map_err(|e| metadata::read_failed(link_file.display().to_string(), e.to_string()))?;
        let source = content
            .lines()
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .ok_or_else(|| metadata::read_failed(link_file.display().to_string(), "empty egg-link"))?;
        let project = link_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            name: project
                .strip_suffix(EGG_LINK_SUFFIX)
                .unwrap_or(&project)
                .to_string(),
            source: PathBuf::from(source),
            link_file: link_file.to_path_buf(),
        })
    }
}

/// All editable links in a site directory, sorted by name
pub fn list(site_dir: &Path) -> Result<Vec<EggLink>> {
    if !site_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut links = Vec::new();
    for entry in fs::read_dir(site_dir)? {
        let path = entry?.path();
        let is_link = path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().ends_with(EGG_LINK_SUFFIX));
        if is_link && path.is_file() {
            links.push(EggLink::read(&path)?);
        }
    }
    links.sort_by(|a, b| name::canonicalize(&a.name).cmp(&name::canonicalize(&b.name)));
    Ok(links)
}

/// The editable link for a project, if one exists
pub fn find(site_dir: &Path, project: &str) -> Result<Option<EggLink>> {
    Ok(list(site_dir)?
        .into_iter()
        .find(|link| name::same(&link.name, project)))
}
