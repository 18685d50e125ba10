//! End-to-end installs through the library API, checked against the
//! `direct_url.json` records they leave behind

mod common;

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use common::{PackageRepo, TestEnv, create_sdist, file_url, write_package_tree};
use sourcemark::error::SourcemarkError;
use sourcemark::install::{InstallKind, Installer};
use sourcemark::metadata;
use sourcemark::record::DirectUrlWriter;
use sourcemark::source::InstallTarget;

fn install(env: &TestEnv, inputs: &[&str]) -> sourcemark::install::InstallReport {
    let targets: Vec<_> = inputs
        .iter()
        .map(|input| InstallTarget::parse(input).expect("target should parse"))
        .collect();
    Installer::new(env.config())
        .expect("installer should build")
        .install(&targets)
}

#[test]
fn test_vcs_tag_records_resolved_commit() {
    let (repo, tagged) = PackageRepo::new("pip-test-package", "0.1.1");
    repo.tag("0.1.1", tagged);
    repo.write_and_commit("CHANGES.txt", "unreleased\n", "work after release");

    let env = TestEnv::new();
    let report = install(&env, &[&format!("git+{}@0.1.1#egg=pip-test-package", repo.url())]);
    report.ensure_success().expect("install should succeed");

    let record = env
        .read_direct_url("pip_test_package-0.1.1.dist-info")
        .expect("record should exist");
    assert_eq!(record["url"], repo.url());
    assert_eq!(record["vcs_info"]["vcs"], "git");
    assert_eq!(record["vcs_info"]["requested_revision"], "0.1.1");
    assert_eq!(record["vcs_info"]["commit_id"], tagged.to_string());
    assert!(record.get("archive_info").is_none());
    assert!(!env.site.join("CHANGES.txt").exists());
}

#[test]
fn test_vcs_subdirectory_is_recorded() {
    let (repo, _) = PackageRepo::new("monorepo", "1.0");
    write_package_tree(&repo.path.join("packages/inner"), "inner", "3.1");
    let head = repo.commit_all("add inner package");

    let env = TestEnv::new();
    let input = format!("git+{}#egg=inner&subdirectory=packages/inner", repo.url());
    install(&env, &[&input])
        .ensure_success()
        .expect("install should succeed");

    let record = env
        .read_direct_url("inner-3.1.dist-info")
        .expect("record should exist");
    assert_eq!(record["subdirectory"], "packages/inner");
    assert_eq!(record["vcs_info"]["commit_id"], head.to_string());
    assert!(env.site.join("inner.py").exists());
    assert!(!env.site.join("monorepo.py").exists());
}

#[test]
fn test_archive_records_sha256() {
    let env = TestEnv::new();
    let sdist = create_sdist(&env.data, "simple", "2.0");
    let expected = sourcemark::hash::hash_file(&sdist).expect("hash should compute");

    let input = format!("simple @ {}", file_url(&sdist));
    install(&env, &[&input])
        .ensure_success()
        .expect("install should succeed");

    let record = env
        .read_direct_url("simple-2.0.dist-info")
        .expect("record should exist");
    assert_eq!(record["url"], file_url(&sdist));
    assert_eq!(record["archive_info"]["hash"], expected.to_string());
    assert!(record.get("vcs_info").is_none());
}

#[test]
fn test_zip_archive_installs() {
    let env = TestEnv::new();
    let archive = env.data.join("zipped-1.5.zip");
    {
        let file = fs::File::create(&archive).expect("Failed to create zip");
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::FileOptions::default();
        writer
            .start_file("zipped-1.5/PKG-INFO", options)
            .expect("Failed to start entry");
        writer
            .write_all(b"Metadata-Version: 2.1\nName: zipped\nVersion: 1.5\n")
            .expect("Failed to write entry");
        writer
            .start_file("zipped-1.5/zipped.py", options)
            .expect("Failed to start entry");
        writer.write_all(b"VALUE = 1\n").expect("Failed to write entry");
        writer.finish().expect("Failed to finish zip");
    }

    install(&env, &[&file_url(&archive)])
        .ensure_success()
        .expect("install should succeed");

    assert!(env.site.join("zipped.py").exists());
    assert!(env.read_direct_url("zipped-1.5.dist-info").is_some());
}

#[test]
fn test_editable_directory_leaves_no_record() {
    let env = TestEnv::new();
    let project = env.data.join("devpkg");
    write_package_tree(&project, "devpkg", "0.3");

    let target = InstallTarget::parse_editable(&project.display().to_string())
        .expect("editable target should parse");
    let report = Installer::new(env.config())
        .expect("installer should build")
        .install(&[target]);
    report.ensure_success().expect("install should succeed");

    let installed: Vec<_> = report.installed().collect();
    assert_eq!(installed[0].kind, InstallKind::Editable);
    assert_eq!(installed[0].direct_url, None);
    assert_eq!(env.site_contents(), vec!["devpkg.egg-link".to_string()]);
}

#[test]
fn test_constraint_redirects_named_requirement() {
    let (repo, head) = PackageRepo::new("constrained", "4.0");
    let env = TestEnv::new();
    let constraints = env.write_file(
        "constraints.txt",
        &format!("# pinned by release\nconstrained @ git+{}\n", repo.url()),
    );

    let mut config = env.config();
    config.constraints.push(constraints);
    let report = Installer::new(config)
        .expect("installer should build")
        .install(&[InstallTarget::parse("constrained").expect("target should parse")]);
    report.ensure_success().expect("install should succeed");

    let record = env
        .read_direct_url("constrained-4.0.dist-info")
        .expect("constrained install should be recorded as a VCS install");
    assert_eq!(record["url"], repo.url());
    assert_eq!(record["vcs_info"]["commit_id"], head.to_string());
}

fn install_constrained(env: &TestEnv, constraint_line: &str, requirement: &str) {
    let constraints = env.write_file("constraints.txt", &format!("{constraint_line}\n"));
    let mut config = env.config();
    config.constraints.push(constraints);
    Installer::new(config)
        .expect("installer should build")
        .install(&[InstallTarget::parse(requirement).expect("target should parse")])
        .ensure_success()
        .expect("install should succeed");
}

#[test]
fn test_egg_constraint_pinned_to_commit() {
    let (repo, first) = PackageRepo::new("testpkg", "0.1");
    repo.write_and_commit("later.py", "", "after the pinned commit");

    let env = TestEnv::new();
    install_constrained(
        &env,
        &format!("git+{}@{first}#egg=testpkg", repo.url()),
        "testpkg",
    );

    let record = env
        .read_direct_url("testpkg-0.1.dist-info")
        .expect("record should exist");
    assert_eq!(record["url"], repo.url());
    assert_eq!(record["vcs_info"]["commit_id"], first.to_string());
    assert_eq!(record["vcs_info"]["requested_revision"], first.to_string());
    assert!(!env.site.join("later.py").exists());
}

#[test]
fn test_egg_constraint_without_revision() {
    let (repo, _) = PackageRepo::new("testpkg", "0.1");
    let head = repo.write_and_commit("later.py", "", "second commit");

    let env = TestEnv::new();
    install_constrained(&env, &format!("git+{}#egg=testpkg", repo.url()), "testpkg");

    let record = env
        .read_direct_url("testpkg-0.1.dist-info")
        .expect("record should exist");
    assert_eq!(record["url"], repo.url());
    assert_eq!(record["vcs_info"]["commit_id"], head.to_string());
    assert!(record["vcs_info"].get("requested_revision").is_none());
    assert!(env.site.join("later.py").exists());
}

#[test]
fn test_find_links_install_is_not_recorded() {
    let env = TestEnv::new();
    create_sdist(&env.data, "indexed", "1.0");
    create_sdist(&env.data, "indexed", "1.2");

    let mut config = env.config();
    config.find_links.push(env.data.clone());
    let report = Installer::new(config)
        .expect("installer should build")
        .install(&[InstallTarget::parse("indexed").expect("target should parse")]);
    report.ensure_success().expect("install should succeed");

    let dist_info = env.dist_info("indexed-1.2.dist-info");
    assert!(dist_info.join("METADATA").exists());
    assert!(!dist_info.join("direct_url.json").exists());
}

struct ReadOnlyWriter;

impl DirectUrlWriter for ReadOnlyWriter {
    fn write(&self, _path: &Path, _content: &[u8]) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only medium"))
    }
}

#[test]
fn test_failed_record_write_leaves_site_untouched() {
    let env = TestEnv::new();
    let sdist = create_sdist(&env.data, "fragile", "1.0");

    let installer = Installer::new(env.config())
        .expect("installer should build")
        .with_writer(Arc::new(ReadOnlyWriter));
    let report = installer.install(&[InstallTarget::parse(&file_url(&sdist)).expect("parse")]);

    assert_eq!(report.failed_count(), 1);
    assert!(matches!(
        report.ensure_success(),
        Err(SourcemarkError::InstallFailed { failed: 1, total: 1 })
    ));
    assert!(env.site_contents().is_empty());
}

#[test]
fn test_one_failure_does_not_stop_other_targets() {
    let env = TestEnv::new();
    let good = create_sdist(&env.data, "good", "1.0");
    let missing = env.data.join("missing-1.0.tar.gz");

    let report = install(&env, &[&file_url(&missing), &file_url(&good)]);

    assert_eq!(report.outcomes.len(), 2);
    assert!(report.outcomes[0].result.is_err());
    let installed = report.outcomes[1].result.as_ref().expect("good should install");
    assert_eq!(installed.name, "good");
    assert!(env.read_direct_url("good-1.0.dist-info").is_some());
}

#[test]
fn test_uninstall_removes_record() {
    let env = TestEnv::new();
    let sdist = create_sdist(&env.data, "removable", "1.0");
    install(&env, &[&file_url(&sdist)])
        .ensure_success()
        .expect("install should succeed");
    assert!(env.read_direct_url("removable-1.0.dist-info").is_some());

    let removed = metadata::uninstall(&env.site, "Removable").expect("uninstall should succeed");
    assert_eq!(removed.version.as_deref(), Some("1.0"));
    assert!(env.site_contents().is_empty());
}

#[test]
fn test_reinstall_replaces_previous_version() {
    let env = TestEnv::new();
    let old = create_sdist(&env.data, "upgraded", "1.0");
    let new = create_sdist(&env.data, "upgraded", "2.0");

    install(&env, &[&file_url(&old)])
        .ensure_success()
        .expect("first install should succeed");
    let report = install(&env, &[&file_url(&new)]);
    report.ensure_success().expect("upgrade should succeed");

    let installed: Vec<_> = report.installed().collect();
    assert_eq!(installed[0].replaced.as_deref(), Some("1.0"));
    assert!(!env.dist_info("upgraded-1.0.dist-info").exists());
    assert!(env.read_direct_url("upgraded-2.0.dist-info").is_some());
}
