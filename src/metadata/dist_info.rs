//! The installed-metadata directory (`<name>-<version>.dist-info`)
//!
//! Holds `METADATA`, `INSTALLER` and `RECORD`. `RECORD` lists every
//! installed file relative to the site directory as `path,sha256=<digest>,size`,
//! with the RECORD file itself listed last without hash or size.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::ProjectMetadata;
use crate::common::fs::write_atomic;
use crate::error::{Result, metadata};
use crate::hash::hash_file_for_record;
use crate::source::name;
use crate::transaction::Transaction;

pub const METADATA_FILE: &str = "METADATA";
pub const INSTALLER_FILE: &str = "INSTALLER";
pub const RECORD_FILE: &str = "RECORD";
pub const DIST_INFO_SUFFIX: &str = ".dist-info";

/// Value written to `INSTALLER`
pub const INSTALLER_NAME: &str = env!("CARGO_PKG_NAME");

/// Directory name for a project: `pip_test_package-0.1.1.dist-info`
pub fn dist_info_dir_name(project: &str, version: &str) -> String {
    format!(
        "{}-{}{}",
        name::dist_info_form(project),
        version.replace('-', "_"),
        DIST_INFO_SUFFIX
    )
}

/// One line of a RECORD file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    /// Path relative to the site directory, `/`-separated
    pub path: String,
    pub hash: Option<String>,
    pub size: Option<u64>,
}

impl RecordEntry {
    /// Entry for an existing file, hashed from disk
    pub fn for_file(site_dir: &Path, relative: &str) -> Result<Self> {
        let (hash, size) = hash_file_for_record(&site_dir.join(relative))?;
        Ok(Self {
            path: relative.to_string(),
            hash: Some(hash),
            size: Some(size),
        })
    }

    fn to_line(&self) -> String {
        let path = if self.path.contains([',', '"', '\n']) {
            format!("\"{}\"", self.path.replace('"', "\"\""))
        } else {
            self.path.clone()
        };
        format!(
            "{},{},{}",
            path,
            self.hash.as_deref().unwrap_or(""),
            self.size.map(|s| s.to_string()).unwrap_or_default()
        )
    }

    fn parse_line(line: &str) -> Option<Self> {
        let (path, rest) = if let Some(quoted) = line.strip_prefix('"') {
            // Find the closing quote that is not a doubled quote
            let mut path = String::new();
            let mut chars = quoted.char_indices().peekable();
            let mut end = None;
            while let Some((idx, c)) = chars.next() {
                if c == '"' {
                    if chars.peek().is_some_and(|(_, next)| *next == '"') {
                        path.push('"');
                        chars.next();
                    } else {
                        end = Some(idx + 1);
                        break;
                    }
                } else {
                    path.push(c);
                }
            }
            let rest = quoted.get(end?..)?.strip_prefix(',')?;
            (path, rest)
        } else {
            let (path, rest) = line.split_once(',')?;
            (path.to_string(), rest)
        };

        let (hash, size) = rest.split_once(',').unwrap_or((rest, ""));
        Some(Self {
            path,
            hash: (!hash.is_empty()).then(|| hash.to_string()),
            size: size.trim().parse().ok(),
        })
    }
}

/// Read the RECORD of a dist-info directory
pub fn read_record(dist_info: &Path) -> Result<Vec<RecordEntry>> {
    let path = dist_info.join(RECORD_FILE);
    let content = fs::read_to_string(&path)
        .map_err(|e| metadata::read_failed(path.display().to_string(), e.to_string()))?;
    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(RecordEntry::parse_line)
        .collect())
}

fn site_dir_of(dist_info: &Path) -> Result<&Path> {
    dist_info.parent().ok_or_else(|| {
        metadata::write_failed(
            dist_info.display().to_string(),
            "dist-info directory has no parent",
        )
    })
}

fn dist_info_relative(dist_info: &Path, file: &str) -> String {
    let dir_name = dist_info
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{dir_name}/{file}")
}

/// Write RECORD with `entries` followed by the RECORD file's own line
fn write_record(dist_info: &Path, entries: &[RecordEntry]) -> Result<()> {
    let own = dist_info_relative(dist_info, RECORD_FILE);
    let mut content = String::new();
    for entry in entries.iter().filter(|entry| entry.path != own) {
        content.push_str(&entry.to_line());
        content.push('\n');
    }
    content.push_str(&format!("{own},,\n"));

    let path = dist_info.join(RECORD_FILE);
    write_atomic(&path, content.as_bytes())
        .map_err(|e| metadata::write_failed(path.display().to_string(), e.to_string()))
}

/// Add an already written file inside `dist_info` to its RECORD
pub fn append_record(dist_info: &Path, file: &str) -> Result<()> {
    let site_dir = site_dir_of(dist_info)?;
    let relative = dist_info_relative(dist_info, file);

    let mut entries = read_record(dist_info)?;
    entries.retain(|entry| entry.path != relative);
    entries.push(RecordEntry::for_file(site_dir, &relative)?);
    write_record(dist_info, &entries)
}

/// Write the dist-info directory for installed files
///
/// `installed` lists files already copied into `site_dir`, relative to it.
/// Every file and directory created here is tracked in `transaction`.
pub fn write_dist_info(
    site_dir: &Path,
    project: &ProjectMetadata,
    installed: &[String],
    transaction: &mut Transaction,
) -> Result<PathBuf> {
    let dist_info = site_dir.join(dist_info_dir_name(&project.name, &project.version));
    transaction
        .create_dir_all(&dist_info)
        .map_err(|e| metadata::write_failed(dist_info.display().to_string(), e.to_string()))?;

    let files = [
        (METADATA_FILE, project.to_metadata_file()),
        (INSTALLER_FILE, format!("{INSTALLER_NAME}\n")),
    ];
    let mut entries = Vec::with_capacity(installed.len() + files.len());
    for relative in installed {
        entries.push(RecordEntry::for_file(site_dir, relative)?);
    }

    for (file, content) in &files {
        let path = dist_info.join(file);
        transaction.track_file_created(&path);
        write_atomic(&path, content.as_bytes())
            .map_err(|e| metadata::write_failed(path.display().to_string(), e.to_string()))?;
        entries.push(RecordEntry::for_file(
            site_dir,
            &dist_info_relative(&dist_info, file),
        )?);
    }

    transaction.track_file_created(dist_info.join(RECORD_FILE));
    write_record(&dist_info, &entries)?;

    debug!(
        dist_info = %dist_info.display(),
        files = entries.len(),
        "metadata written"
    );
    Ok(dist_info)
}
