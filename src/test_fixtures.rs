//! Test fixtures for building package sources on disk.
//!
//! Provides temp directories, git repositories with committed package trees,
//! and sdist-style archives so tests can exercise the install pipeline
//! without network access.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_fixtures::{create_package_repo, write_tar_gz};
//!
//! #[test]
//! fn my_test() {
//!     let (temp, repo_path, head) = create_package_repo("testpkg", "1.0");
//!     let archive = write_tar_gz(&package_tree, &temp.path().join("testpkg-1.0.tar.gz"), "testpkg-1.0");
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use git2::{Oid, Repository, Signature};
use tempfile::TempDir;

/// Create a temp directory in the system temp location.
///
/// # Panics
///
/// Panics if the temp directory cannot be created.
#[must_use]
pub fn create_temp_dir() -> TempDir {
    TempDir::new_in(crate::temp::temp_dir_base()).expect("Failed to create temp directory")
}

/// Create a temp directory with an empty git repository initialized.
///
/// # Panics
///
/// Panics if the temp directory or git repository cannot be created.
#[must_use]
pub fn create_git_repo() -> (TempDir, PathBuf) {
    let temp = create_temp_dir();
    let path = temp.path().to_path_buf();
    Repository::init(&path).expect("Failed to init git repository");
    (temp, path)
}

/// Write `content` to `relative` in the working tree and commit it on HEAD.
///
/// # Panics
///
/// Panics if any git operation fails.
pub fn commit_file(repo: &Repository, relative: &str, content: &str, message: &str) -> Oid {
    let workdir = repo.workdir().expect("repository has no working tree");
    let path = workdir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(&path, content).expect("Failed to write file");
    commit_all(repo, message)
}

/// Stage every file in the working tree and commit it on HEAD.
///
/// # Panics
///
/// Panics if any git operation fails.
pub fn commit_all(repo: &Repository, message: &str) -> Oid {
    let mut index = repo.index().expect("Failed to open index");
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .expect("Failed to stage files");
    index.write().expect("Failed to write index");
    let tree_id = index.write_tree().expect("Failed to write tree");
    let tree = repo.find_tree(tree_id).expect("Failed to find tree");

    let sig = Signature::now("Test", "test@test.com").expect("Failed to create signature");
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<_> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .expect("Failed to commit")
}

/// Create a lightweight tag pointing at `target`.
///
/// # Panics
///
/// Panics if the tag cannot be created.
pub fn tag(repo: &Repository, name: &str, target: Oid) {
    let object = repo.find_object(target, None).expect("Failed to find object");
    repo.tag_lightweight(name, &object, false)
        .expect("Failed to create tag");
}

/// Write a minimal source tree for a project: `PKG-INFO` plus one module.
///
/// # Panics
///
/// Panics if the files cannot be written.
pub fn write_package_tree(root: &Path, name: &str, version: &str) {
    fs::create_dir_all(root).expect("Failed to create package root");
    fs::write(
        root.join("PKG-INFO"),
        format!("Metadata-Version: 2.1\nName: {name}\nVersion: {version}\n"),
    )
    .expect("Failed to write PKG-INFO");
    let module = crate::source::name::dist_info_form(name);
    fs::write(
        root.join(format!("{module}.py")),
        format!("__version__ = \"{version}\"\n"),
    )
    .expect("Failed to write module");
}

/// Create a git repository holding a package tree, committed once.
///
/// Returns the temp dir, the repository path and the commit id.
///
/// # Panics
///
/// Panics if any step fails.
#[must_use]
pub fn create_package_repo(name: &str, version: &str) -> (TempDir, PathBuf, Oid) {
    let (temp, path) = create_git_repo();
    write_package_tree(&path, name, version);
    let repo = Repository::open(&path).expect("Failed to open repository");
    let oid = commit_all(&repo, &format!("{name} {version}"));
    (temp, path, oid)
}

/// Pack `source` into a gzipped tarball with every entry under `prefix/`.
///
/// # Panics
///
/// Panics if the archive cannot be written.
pub fn write_tar_gz(source: &Path, archive: &Path, prefix: &str) -> PathBuf {
    let file = fs::File::create(archive).expect("Failed to create archive");
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder
        .append_dir_all(prefix, source)
        .expect("Failed to append directory");
    builder
        .into_inner()
        .and_then(flate2::write::GzEncoder::finish)
        .expect("Failed to finish archive");
    archive.to_path_buf()
}

/// Pack `source` into a zip file with every entry under `prefix/`.
///
/// # Panics
///
/// Panics if the archive cannot be written.
pub fn write_zip(source: &Path, archive: &Path, prefix: &str) -> PathBuf {
    use std::io::Write;

    let file = fs::File::create(archive).expect("Failed to create archive");
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default();
    for entry in walkdir::WalkDir::new(source).sort_by_file_name() {
        let entry = entry.expect("Failed to walk source");
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(source)
            .expect("entry outside source");
        let name = format!("{prefix}/{}", relative.to_string_lossy().replace('\\', "/"));
        zip.start_file(name, options).expect("Failed to start entry");
        zip.write_all(&fs::read(entry.path()).expect("Failed to read file"))
            .expect("Failed to write entry");
    }
    zip.finish().expect("Failed to finish archive");
    archive.to_path_buf()
}

/// Build `<dir>/<name>-<version>.tar.gz` holding a package tree.
///
/// # Panics
///
/// Panics if any step fails.
pub fn create_sdist(dir: &Path, name: &str, version: &str) -> PathBuf {
    let staging = create_temp_dir();
    write_package_tree(staging.path(), name, version);
    write_tar_gz(
        staging.path(),
        &dir.join(format!("{name}-{version}.tar.gz")),
        &format!("{name}-{version}"),
    )
}
