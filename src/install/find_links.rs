//! Find-links directories
//!
//! Flat directories of `<name>-<version>.tar.gz`, `.zip` or `.whl` files
//! standing in for a package index. An `==` pin selects that version;
//! any other requirement takes the highest version available.

use std::cmp::Ordering;
use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{Result, SourcemarkError};
use crate::link;
use crate::source::{IndexRequirement, name};

/// An archive picked from a find-links directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundArchive {
    pub path: PathBuf,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default)]
pub struct FindLinks {
    dirs: Vec<PathBuf>,
}

impl FindLinks {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// All archives for `project`, in directory order
    fn candidates(&self, project: &str) -> Result<Vec<FoundArchive>> {
        let mut found = Vec::new();
        for dir in &self.dirs {
            if !dir.is_dir() {
                debug!(dir = %dir.display(), "find-links directory missing");
                continue;
            }
            for entry in fs::read_dir(dir)? {
                let entry = entry?;
                let file_name = entry.file_name().to_string_lossy().into_owned();
                let Some((archive_name, Some(version))) = link::split_archive_name(&file_name)
                else {
                    continue;
                };
                if name::same(&archive_name, project) && entry.file_type()?.is_file() {
                    found.push(FoundArchive {
                        path: entry.path(),
                        name: archive_name,
                        version,
                    });
                }
            }
        }
        Ok(found)
    }

    /// The archive satisfying `requirement`
    pub fn find(&self, requirement: &IndexRequirement) -> Result<FoundArchive> {
        let candidates = self.candidates(&requirement.name)?;
        let chosen = match requirement.pinned_version() {
            Some(pin) => candidates
                .into_iter()
                .find(|candidate| compare_versions(&candidate.version, pin) == Ordering::Equal),
            None => candidates
                .into_iter()
                .max_by(|a, b| compare_versions(&a.version, &b.version)),
        };

        let found = chosen.ok_or_else(|| SourcemarkError::PackageNotFound {
            name: match &requirement.version_spec {
                Some(spec) => format!("{}{spec}", requirement.name),
                None => requirement.name.clone(),
            },
        })?;
        debug!(
            name = %requirement.name,
            version = %found.version,
            path = %found.path.display(),
            "found in find-links"
        );
        Ok(found)
    }
}

/// Order versions by their dot-separated release segments
///
/// Numeric segments compare as numbers, anything else lexically; missing
/// trailing segments count as zero, so `2.0 == 2`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split(['.', '-', '_']);
    let mut right = b.split(['.', '-', '_']);
    loop {
        let ordering = match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (Some(x), None) => compare_segment(x, "0"),
            (None, Some(y)) => compare_segment("0", y),
            (Some(x), Some(y)) => compare_segment(x, y),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

fn compare_segment(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        // A release segment sorts after a pre-release tag like `0rc1`
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
