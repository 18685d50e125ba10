//! Common file system operations

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Directory names that hold version control metadata
pub const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn", ".bzr"];

#[derive(Debug, Default, Clone)]
pub struct CopyOptions {
    /// Entry names skipped at any depth
    pub exclude: Vec<String>,
}

impl CopyOptions {
    pub fn exclude_vcs() -> Self {
        Self {
            exclude: VCS_DIRS.iter().map(ToString::to_string).collect(),
        }
    }

    fn is_excluded(&self, name: &std::ffi::OsStr) -> bool {
        self.exclude
            .iter()
            .any(|excluded| name.to_str() == Some(excluded.as_str()))
    }
}

/// Copy a directory recursively, returning the number of files copied
///
/// Symlinks are followed.
pub fn copy_dir_recursive(src: &Path, dst: &Path, options: &CopyOptions) -> io::Result<usize> {
    fs::create_dir_all(dst)?;

    let mut copied = 0;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let file_name = entry.file_name();
        if options.is_excluded(&file_name) {
            continue;
        }

        let entry_path = entry.path();
        let dst_path = dst.join(&file_name);
        if entry_path.is_dir() {
            copied += copy_dir_recursive(&entry_path, &dst_path, options)?;
        } else {
            fs::copy(&entry_path, &dst_path)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Write a file atomically
///
/// The content goes to a uniquely named temporary file in the same
/// directory, is synced, and is then renamed over `path`. Readers never see a
/// partial file, and a failed write leaves neither `path` nor the temporary
/// file behind.
pub fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
