//! CLI integration tests

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

use common::{PackageRepo, TestEnv, create_sdist, file_url, write_package_tree};

#[allow(deprecated)]
fn sourcemark_cmd() -> Command {
    Command::cargo_bin("sourcemark").unwrap()
}

#[test]
fn test_help_output() {
    sourcemark_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("direct URL provenance"))
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("uninstall"))
        .stdout(predicate::str::contains("show"));
}

#[test]
fn test_version_output() {
    sourcemark_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sourcemark"));
}

#[test]
fn test_install_requires_a_target() {
    let env = TestEnv::new();
    env.cmd()
        .arg("install")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_install_show_list_uninstall_flow() {
    let env = TestEnv::new();
    let sdist = create_sdist(&env.data, "flowpkg", "1.0");
    let url = file_url(&sdist);

    env.cmd()
        .args(["install", &url])
        .assert()
        .success()
        .stdout(predicate::str::contains("flowpkg 1.0"))
        .stdout(predicate::str::contains("Installed 1 package(s)"));

    env.cmd()
        .args(["show", "FlowPkg"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Version:"))
        .stdout(predicate::str::contains(url.as_str()))
        .stdout(predicate::str::contains("sha256="));

    env.cmd()
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed packages (1):"))
        .stdout(predicate::str::contains("flowpkg"));

    env.cmd()
        .args(["uninstall", "flowpkg", "-y"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed flowpkg 1.0"));

    env.cmd()
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No packages installed"));
    assert!(env.site_contents().is_empty());
}

#[test]
fn test_show_json_prints_record() {
    let (repo, head) = PackageRepo::new("jsonpkg", "0.2");
    repo.tag("v0.2", head);
    let env = TestEnv::new();

    env.cmd()
        .args(["install", &format!("git+{}@v0.2#egg=jsonpkg", repo.url())])
        .assert()
        .success();

    let output = env
        .cmd()
        .args(["show", "jsonpkg", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["url"], repo.url());
    assert_eq!(record["vcs_info"]["commit_id"], head.to_string());
    assert_eq!(record["vcs_info"]["requested_revision"], "v0.2");
}

#[test]
fn test_editable_install_shows_as_editable() {
    let env = TestEnv::new();
    let project = env.data.join("devtool");
    write_package_tree(&project, "devtool", "0.1");

    env.cmd()
        .args(["install", "-e"])
        .arg(&project)
        .assert()
        .success();

    env.cmd()
        .args(["show", "devtool", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::diff("null\n"));

    env.cmd()
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("devtool"));
}

#[test]
fn test_failed_target_exits_with_error() {
    let env = TestEnv::new();
    let good = create_sdist(&env.data, "survivor", "1.0");
    let missing = env.data.join("ghost-1.0.tar.gz");

    env.cmd()
        .args(["install", &file_url(&missing), &file_url(&good)])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("survivor 1.0"))
        .stderr(predicate::str::contains("ghost-1.0.tar.gz"))
        .stderr(predicate::str::contains("Error:"));

    assert!(env.read_direct_url("survivor-1.0.dist-info").is_some());
}

#[test]
fn test_invalid_target_is_rejected_before_installing() {
    let env = TestEnv::new();
    env.cmd()
        .args(["install", "git+"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
    assert!(env.site_contents().is_empty());
}

#[test]
fn test_show_missing_package() {
    let env = TestEnv::new();
    env.cmd()
        .args(["show", "absent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent"));
}

#[test]
fn test_uninstall_missing_package_removes_nothing() {
    let env = TestEnv::new();
    let sdist = create_sdist(&env.data, "kept", "1.0");
    env.cmd().args(["install", &file_url(&sdist)]).assert().success();

    env.cmd()
        .args(["uninstall", "kept", "absent", "-y"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent"));
    assert!(env.dist_info("kept-1.0.dist-info").exists());
}

#[test]
fn test_find_links_and_constraint_flags() {
    let env = TestEnv::new();
    create_sdist(&env.data, "linked", "1.0");
    create_sdist(&env.data, "linked", "1.1");
    let constraints = env.write_file("constraints.txt", "linked==1.0\n");

    env.cmd()
        .args(["install", "linked", "-f"])
        .arg(&env.data)
        .arg("-c")
        .arg(&constraints)
        .assert()
        .success()
        .stdout(predicate::str::contains("linked 1.0"));

    let dist_info = env.dist_info("linked-1.0.dist-info");
    assert!(dist_info.join("METADATA").exists());
    assert!(!dist_info.join("direct_url.json").exists());
}

#[test]
fn test_config_file_sets_site_dir() {
    let env = TestEnv::new();
    let sdist = create_sdist(&env.data, "configured", "1.0");
    let config = env.write_file("sourcemark.yaml", "site_dir: custom-site\n");

    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("sourcemark").unwrap();
    cmd.env_remove("SOURCEMARK_TARGET")
        .env("SOURCEMARK_CONFIG", &config)
        .env("TMPDIR", env.temp.path())
        .current_dir(env.temp.path())
        .args(["install", &file_url(&sdist)])
        .assert()
        .success();

    let site = env.temp.path().join("custom-site");
    assert!(site.join("configured-1.0.dist-info/direct_url.json").exists());
}

#[test]
fn test_target_env_var() {
    let env = TestEnv::new();
    let sdist = create_sdist(&env.data, "envsite", "1.0");
    let site = env.temp.path().join("from-env");

    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("sourcemark").unwrap();
    cmd.env_remove("SOURCEMARK_CONFIG")
        .env("XDG_CONFIG_HOME", env.temp.path().join("config"))
        .env("HOME", env.temp.path())
        .env("SOURCEMARK_TARGET", &site)
        .env("TMPDIR", env.temp.path())
        .args(["install", &file_url(&sdist)])
        .assert()
        .success();

    assert!(site.join("envsite-1.0.dist-info/METADATA").exists());
}

#[test]
fn test_completions() {
    sourcemark_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sourcemark"));

    sourcemark_cmd()
        .args(["completions", "tcsh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown shell"));
}

#[test]
fn test_install_reports_targets_in_command_line_order() {
    let env = TestEnv::new();
    let project = env.data.join("firstdev");
    write_package_tree(&project, "firstdev", "0.1");
    let sdist = create_sdist(&env.data, "secondpkg", "1.0");

    env.cmd()
        .args(["install", "-e"])
        .arg(&project)
        .arg(file_url(&sdist))
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?s)firstdev 0\.1.*secondpkg 1\.0").unwrap());
}
