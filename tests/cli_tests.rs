//! CLI tests for artifact-resolver

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get the binary to test
#[allow(deprecated)]
fn resolver_cmd() -> Command {
    let mut cmd = Command::cargo_bin("artifact-resolver").unwrap();
    cmd.env_remove("ARTIFACT_RESOLVER_CONFIG");
    cmd
}

fn publish(repo: &Path, relative: &str, content: &[u8]) {
    let path = repo.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn file_url(dir: &Path) -> String {
    url::Url::from_directory_path(dir).unwrap().to_string()
}

// ============================================================================
// RESOLVE
// ============================================================================

#[test]
fn test_resolve_prints_local_path() {
    let remote = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    publish(
        remote.path(),
        "org/example/hello/1.0.0/hello-1.0.0.jar",
        b"jar",
    );

    resolver_cmd()
        .args([
            "resolve",
            "org.example:hello:1.0.0",
            "--local-repo",
            cache.path().to_str().unwrap(),
            "--repo",
            &format!("central={}", file_url(remote.path())),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello-1.0.0.jar"));

    assert!(cache
        .path()
        .join("org/example/hello/1.0.0/hello-1.0.0.jar")
        .is_file());
}

#[test]
fn test_resolve_json_output() {
    let remote = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    publish(
        remote.path(),
        "org/example/hello/1.0.0/hello-1.0.0-exec.jar",
        b"jar",
    );

    let output = resolver_cmd()
        .args([
            "resolve",
            "org.example:hello:jar:exec:1.0.0",
            "--json",
            "--local-repo",
            cache.path().to_str().unwrap(),
            "--repo",
            &format!("central={}", file_url(remote.path())),
        ])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout).to_string();
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["coordinate"]["classifier"], "exec");
    assert!(json["local_file_path"]
        .as_str()
        .unwrap()
        .ends_with("hello-1.0.0-exec.jar"));
}

#[test]
fn test_resolve_failure_lists_repositories() {
    let a = TempDir::new().unwrap();
    let b = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();

    resolver_cmd()
        .args([
            "resolve",
            "org.example:missing:1.0.0",
            "--local-repo",
            cache.path().to_str().unwrap(),
            "--repo",
            &format!("central={}", file_url(a.path())),
            "--repo",
            &format!("mirror={}", file_url(b.path())),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Configured remote repositories: [central,mirror]",
        ))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_resolve_offline_flag() {
    let remote = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    publish(
        remote.path(),
        "org/example/hello/1.0.0/hello-1.0.0.jar",
        b"jar",
    );

    resolver_cmd()
        .args([
            "resolve",
            "org.example:hello:1.0.0",
            "--offline",
            "--local-repo",
            cache.path().to_str().unwrap(),
            "--repo",
            &format!("central={}", file_url(remote.path())),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("offline"));
}

#[test]
fn test_malformed_coordinate() {
    let cache = TempDir::new().unwrap();

    resolver_cmd()
        .args([
            "resolve",
            "not-a-coordinate",
            "--local-repo",
            cache.path().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed coordinate"));
}

#[test]
fn test_resolve_with_config_file() {
    let remote = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    publish(
        remote.path(),
        "org/example/hello/1.0.0/hello-1.0.0.pom",
        b"<project/>",
    );
    publish(
        remote.path(),
        "org/example/hello/1.0.0/hello-1.0.0.jar",
        b"jar",
    );

    let cache = work.path().join("cache");
    let config_file = work.path().join("resolver.yaml");
    fs::write(
        &config_file,
        format!(
            "local-repository: {}\nresolve-pom: true\nremote-repositories:\n  central:\n    url: {}\n",
            cache.display(),
            file_url(remote.path())
        ),
    )
    .unwrap();

    resolver_cmd()
        .args(["--config", config_file.to_str().unwrap()])
        .args(["resolve", "org.example:hello:1.0.0"])
        .assert()
        .success();

    assert!(cache.join("org/example/hello/1.0.0/hello-1.0.0.pom").is_file());
}

// ============================================================================
// CONFIG
// ============================================================================

#[test]
fn test_config_masks_passwords() {
    let work = TempDir::new().unwrap();
    let config_file = work.path().join("resolver.toml");
    fs::write(
        &config_file,
        r#"
local-repository = "/tmp/artifact-cache"

[remote-repositories.internal]
url = "https://repo.example.com"
auth = { username = "deployer", password = "topsecret" }
"#,
    )
    .unwrap();

    resolver_cmd()
        .args(["--config", config_file.to_str().unwrap(), "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("deployer"))
        .stdout(predicate::str::contains("topsecret").not());
}

#[test]
fn test_missing_config_file() {
    resolver_cmd()
        .args(["--config", "/nonexistent/resolver.yaml", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config error"));
}
