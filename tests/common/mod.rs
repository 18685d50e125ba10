//! Common test utilities for Sourcemark integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use git2::{IndexAddOption, Oid, Repository, Signature};
use tempfile::TempDir;

/// An isolated site directory plus scratch space for sources
pub struct TestEnv {
    pub temp: TempDir,
    pub site: PathBuf,
    pub data: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let site = temp.path().join("site-packages");
        let data = temp.path().join("data");
        fs::create_dir_all(&data).expect("Failed to create data directory");
        Self { temp, site, data }
    }

    /// Library configuration installing into this environment
    pub fn config(&self) -> sourcemark::config::InstallConfig {
        let mut config = sourcemark::config::InstallConfig::new(&self.site);
        config.staging_root = self.temp.path().join("staging");
        config.src_dir = self.temp.path().join("src");
        config
    }

    /// The binary, isolated from the user's config and environment
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("sourcemark").expect("binary should be built");
        cmd.env_remove("SOURCEMARK_CONFIG")
            .env_remove("SOURCEMARK_TARGET")
            .env_remove("RUST_LOG")
            .env("XDG_CONFIG_HOME", self.temp.path().join("config"))
            .env("HOME", self.temp.path())
            .env("TMPDIR", self.temp.path())
            .current_dir(self.temp.path())
            .arg("--target")
            .arg(&self.site);
        cmd
    }

    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.temp.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    pub fn dist_info(&self, dir_name: &str) -> PathBuf {
        self.site.join(dir_name)
    }

    /// Parsed `direct_url.json` of an installed dist-info directory
    pub fn read_direct_url(&self, dir_name: &str) -> Option<serde_json::Value> {
        let path = self.dist_info(dir_name).join("direct_url.json");
        let json = fs::read_to_string(path).ok()?;
        Some(serde_json::from_str(&json).expect("direct_url.json should be valid JSON"))
    }

    /// Every path left in the site directory, relative and sorted
    pub fn site_contents(&self) -> Vec<String> {
        if !self.site.exists() {
            return Vec::new();
        }
        let mut entries: Vec<_> = walkdir::WalkDir::new(&self.site)
            .min_depth(1)
            .into_iter()
            .map(|entry| {
                let entry = entry.expect("Failed to walk site directory");
                entry
                    .path()
                    .strip_prefix(&self.site)
                    .expect("entry outside site")
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        entries.sort();
        entries
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// `file://` URL of a local path
pub fn file_url(path: &Path) -> String {
    sourcemark::link::path_to_url(path).expect("path should convert to a URL")
}

/// Write `PKG-INFO` plus one module for a project
pub fn write_package_tree(root: &Path, name: &str, version: &str) {
    fs::create_dir_all(root).expect("Failed to create package root");
    fs::write(
        root.join("PKG-INFO"),
        format!("Metadata-Version: 2.1\nName: {name}\nVersion: {version}\n"),
    )
    .expect("Failed to write PKG-INFO");
    fs::write(
        root.join(format!("{}.py", module_name(name))),
        format!("__version__ = \"{version}\"\n"),
    )
    .expect("Failed to write module");
}

pub fn module_name(name: &str) -> String {
    name.to_lowercase().replace(['-', '.'], "_")
}

/// `<dir>/<name>-<version>.tar.gz` holding a package tree
pub fn create_sdist(dir: &Path, name: &str, version: &str) -> PathBuf {
    let staging = TempDir::new().expect("Failed to create temp directory");
    write_package_tree(staging.path(), name, version);

    let archive = dir.join(format!("{name}-{version}.tar.gz"));
    let file = fs::File::create(&archive).expect("Failed to create archive");
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder
        .append_dir_all(format!("{name}-{version}"), staging.path())
        .expect("Failed to append directory");
    builder
        .into_inner()
        .and_then(flate2::write::GzEncoder::finish)
        .expect("Failed to finish archive");
    archive
}

/// A git repository with a package tree committed once
pub struct PackageRepo {
    pub temp: TempDir,
    pub path: PathBuf,
    pub repo: Repository,
}

impl PackageRepo {
    pub fn new(name: &str, version: &str) -> (Self, Oid) {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().join(name);
        let repo = Repository::init(&path).expect("Failed to init repository");
        {
            let mut config = repo.config().expect("Failed to open repository config");
            config
                .set_str("user.name", "Test User")
                .expect("Failed to set user.name");
            config
                .set_str("user.email", "test@example.com")
                .expect("Failed to set user.email");
        }
        write_package_tree(&path, name, version);
        let package = Self { temp, path, repo };
        let oid = package.commit_all(&format!("{name} {version}"));
        (package, oid)
    }

    pub fn url(&self) -> String {
        file_url(&self.path)
    }

    pub fn commit_all(&self, message: &str) -> Oid {
        let mut index = self.repo.index().expect("Failed to open index");
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .expect("Failed to add files");
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");
        let signature = Signature::now("Test User", "test@example.com")
            .expect("Failed to create signature");

        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<_> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .expect("Failed to commit")
    }

    pub fn write_and_commit(&self, relative: &str, content: &str, message: &str) -> Oid {
        let path = self.path.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(path, content).expect("Failed to write file");
        self.commit_all(message)
    }

    pub fn tag(&self, name: &str, target: Oid) {
        let object = self
            .repo
            .find_object(target, None)
            .expect("Failed to find tag target");
        self.repo
            .tag_lightweight(name, &object, false)
            .expect("Failed to create tag");
    }
}
