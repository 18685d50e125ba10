//! Package metadata: discovery in source trees and installed distributions
//!
//! ## Module Organization
//!
//! - `dist_info.rs`: Writing `<name>-<version>.dist-info` and its RECORD
//! - `installed.rs`: Listing, reading and uninstalling installed distributions
//! - `egg_link.rs`: Editable install links

pub mod dist_info;
pub mod egg_link;
pub mod installed;

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, metadata};

pub use dist_info::{RecordEntry, dist_info_dir_name, write_dist_info};
pub use egg_link::EggLink;
pub use installed::{InstalledDistribution, find_installed, list_installed, uninstall};

pub const PKG_INFO_FILE: &str = "PKG-INFO";
pub const PYPROJECT_FILE: &str = "pyproject.toml";

/// Name and version of a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMetadata {
    pub name: String,
    pub version: String,
}

impl ProjectMetadata {
    /// Content of a core metadata file for this project
    pub fn to_metadata_file(&self) -> String {
        format!(
            "Metadata-Version: 2.1\nName: {}\nVersion: {}\n",
            self.name, self.version
        )
    }
}

/// Whatever a source tree declares about itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredProject {
    pub name: Option<String>,
    pub version: Option<String>,
}

/// Read `Name` and `Version` headers from core metadata (PKG-INFO / METADATA)
pub fn parse_core_metadata(content: &str) -> DiscoveredProject {
    let mut project = DiscoveredProject::default();
    for line in content.lines() {
        // Headers end at the first blank line; the description follows
        if line.trim().is_empty() {
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key.trim().to_ascii_lowercase().as_str() {
            "name" if project.name.is_none() => project.name = Some(value.to_string()),
            "version" if project.version.is_none() => project.version = Some(value.to_string()),
            _ => {}
        }
    }
    project
}

fn parse_pyproject(path: &Path) -> Result<DiscoveredProject> {
    let content = fs::read_to_string(path)
        .map_err(|e| metadata::read_failed(path.display().to_string(), e.to_string()))?;
    let value: toml::Value = toml::from_str(&content)
        .map_err(|e| metadata::read_failed(path.display().to_string(), e.to_string()))?;

    let project = value.get("project");
    let field = |key: &str| {
        project
            .and_then(|p| p.get(key))
            .and_then(toml::Value::as_str)
            .map(str::to_string)
    };
    Ok(DiscoveredProject {
        name: field("name"),
        version: field("version"),
    })
}

/// Discover the project a source tree declares
///
/// Looks at `PKG-INFO`, then `pyproject.toml` `[project]`, then the
/// `METADATA` of a top-level `*.dist-info` directory (unpacked wheels).
/// Missing fields stay `None`.
pub fn discover(root: &Path) -> Result<DiscoveredProject> {
    let pkg_info = root.join(PKG_INFO_FILE);
    if pkg_info.is_file() {
        let content = fs::read_to_string(&pkg_info)
            .map_err(|e| metadata::read_failed(pkg_info.display().to_string(), e.to_string()))?;
        let project = parse_core_metadata(&content);
        if project.name.is_some() {
            debug!(source = %pkg_info.display(), ?project, "discovered project");
            return Ok(project);
        }
    }

    let pyproject = root.join(PYPROJECT_FILE);
    if pyproject.is_file() {
        let project = parse_pyproject(&pyproject)?;
        if project.name.is_some() {
            debug!(source = %pyproject.display(), ?project, "discovered project");
            return Ok(project);
        }
    }

    if let Some(wheel_dist_info) = top_level_dist_info(root)? {
        let wheel_metadata = wheel_dist_info.join(dist_info::METADATA_FILE);
        if wheel_metadata.is_file() {
            let content = fs::read_to_string(&wheel_metadata).map_err(|e| {
                metadata::read_failed(wheel_metadata.display().to_string(), e.to_string())
            })?;
            return Ok(parse_core_metadata(&content));
        }
    }

    Ok(DiscoveredProject::default())
}

/// The `*.dist-info` directory at the top of an unpacked wheel, if any
pub fn top_level_dist_info(root: &Path) -> Result<Option<std::path::PathBuf>> {
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let is_dist_info = entry
            .file_name()
            .to_string_lossy()
            .ends_with(dist_info::DIST_INFO_SUFFIX);
        if is_dist_info && entry.file_type()?.is_dir() {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}
