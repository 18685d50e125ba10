//! Transaction support for atomic installs
//!
//! Every file and directory an install creates is tracked, and every file it
//! removes (when replacing an installed distribution) is backed up first. If
//! the transaction is dropped without being committed, all of it is undone,
//! so an aborted install leaves neither package files nor metadata behind.
//!
//! ## Usage
//!
//! ```ignore
//! let mut transaction = Transaction::new("simple @ file:///data/simple-2.0.tar.gz");
//! transaction.remove_file_with_backup(&old_file)?;
//!
//! // Perform operations...
//! transaction.track_file_created(path);
//!
//! // On success:
//! transaction.commit();
//!
//! // On error (automatic via Drop if not committed):
//! // rollback happens automatically
//! ```

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, SourcemarkError};
use crate::hash::{ArchiveHash, hash_file};

/// Content of a file removed during the transaction
#[derive(Debug, Clone)]
struct FileBackup {
    path: PathBuf,
    content: Vec<u8>,
}

/// A transaction for atomic install operations
#[derive(Debug)]
pub struct Transaction {
    /// What is being installed, for log lines
    label: String,

    /// Files created during this transaction
    created_files: HashSet<PathBuf>,

    /// Content hash of files as this transaction wrote them
    written: HashMap<PathBuf, ArchiveHash>,

    /// Directories created during this transaction
    created_dirs: HashSet<PathBuf>,

    /// Files removed during this transaction (with original content)
    removed_files: Vec<FileBackup>,

    /// Whether the transaction has been committed
    committed: bool,
}

impl Transaction {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            created_files: HashSet::new(),
            written: HashMap::new(),
            created_dirs: HashSet::new(),
            removed_files: Vec::new(),
            committed: false,
        }
    }

    /// Track a file that was created during this transaction
    pub fn track_file_created(&mut self, path: impl Into<PathBuf>) {
        self.created_files.insert(path.into());
    }

    /// Track a file this transaction has finished writing
    ///
    /// Rollback leaves the file alone if its content no longer matches,
    /// since another install has written it since.
    pub fn track_file_written(&mut self, path: &Path) -> Result<()> {
        let digest = hash_file(path)?;
        self.created_files.insert(path.to_path_buf());
        self.written.insert(path.to_path_buf(), digest);
        Ok(())
    }

    /// Track a directory that was created during this transaction
    pub fn track_dir_created(&mut self, path: impl Into<PathBuf>) {
        self.created_dirs.insert(path.into());
    }

    /// Create `dir` and any missing parents, tracking each one created
    pub fn create_dir_all(&mut self, dir: &Path) -> Result<()> {
        let mut missing = Vec::new();
        let mut current = Some(dir);
        while let Some(path) = current {
            if path.exists() {
                break;
            }
            missing.push(path.to_path_buf());
            current = path.parent();
        }

        fs::create_dir_all(dir).map_err(|e| SourcemarkError::IoError {
            message: format!("Failed to create directory {}: {}", dir.display(), e),
        })?;
        for path in missing {
            self.track_dir_created(path);
        }
        Ok(())
    }

    /// Remove a file, keeping its content so rollback can restore it
    pub fn remove_file_with_backup(&mut self, path: &Path) -> Result<()> {
        let content = fs::read(path).map_err(|e| SourcemarkError::IoError {
            message: format!("Failed to back up {}: {}", path.display(), e),
        })?;
        fs::remove_file(path).map_err(|e| SourcemarkError::IoError {
            message: format!("Failed to remove {}: {}", path.display(), e),
        })?;
        self.removed_files.push(FileBackup {
            path: path.to_path_buf(),
            content,
        });
        Ok(())
    }

    /// Number of files and directories that a rollback would touch
    pub fn tracked_len(&self) -> usize {
        self.created_files.len() + self.created_dirs.len() + self.removed_files.len()
    }

    /// Commit the transaction (prevent rollback)
    pub fn commit(mut self) {
        self.committed = true;
        debug!(label = %self.label, "transaction committed");
    }

    /// Manually trigger a rollback
    pub fn rollback(&mut self) {
        if self.committed {
            return;
        }
        debug!(
            label = %self.label,
            files = self.created_files.len(),
            dirs = self.created_dirs.len(),
            restored = self.removed_files.len(),
            "rolling back"
        );

        let mut taken_over = HashSet::new();
        for path in self.created_files.drain() {
            if !path.exists() {
                continue;
            }
            if let Some(expected) = self.written.get(&path) {
                if hash_file(&path).ok().as_ref() != Some(expected) {
                    debug!(path = %path.display(), "left in place, rewritten by another install");
                    taken_over.insert(path);
                    continue;
                }
            }
            if let Err(e) = fs::remove_file(&path) {
                warn!("Failed to remove {}: {}", path.display(), e);
            }
        }
        self.written.clear();

        // Deepest first so nested directories empty out before their parents
        let mut dirs: Vec<_> = self.created_dirs.drain().collect();
        dirs.sort_by_key(|dir| std::cmp::Reverse(dir.components().count()));
        for path in dirs {
            let is_empty = fs::read_dir(&path).is_ok_and(|mut entries| entries.next().is_none());
            if is_empty {
                if let Err(e) = fs::remove_dir(&path) {
                    warn!("Failed to remove {}: {}", path.display(), e);
                }
            }
        }

        for backup in self.removed_files.drain(..) {
            if taken_over.contains(&backup.path) {
                continue;
            }
            let restored = backup
                .path
                .parent()
                .map_or(Ok(()), fs::create_dir_all)
                .and_then(|()| fs::write(&backup.path, &backup.content));
            if let Err(e) = restored {
                warn!("Failed to restore {}: {}", backup.path.display(), e);
            }
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.committed {
            self.rollback();
        }
    }
}
