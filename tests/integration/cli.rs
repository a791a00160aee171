//! Tests for the `config-updater` binary

use assert_cmd::Command;
use assert_cmd::assert::OutputAssertExt;
use config_updater::cache::UpdateLock;
use predicates::prelude::*;
use std::path::Path;
use std::process::Output;

use crate::common::{TestDirs, TestRegistry, real_bundle};

/// Runs the binary with `args` against the settings file, off the async runtime.
async fn run(settings: &Path, args: &[&str]) -> Output {
    let mut cmd = Command::cargo_bin("config-updater").unwrap();
    cmd.arg("--config")
        .arg(settings)
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("CONFIG_UPDATER_CONFIG");

    tokio::task::spawn_blocking(move || cmd.output().unwrap()).await.unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_check_reports_update() {
    let dirs = TestDirs::new();
    let mut registry = TestRegistry::start().await;
    registry.publish_listing(&["7.2.4", "7.2.5-20200101", "7.2.5-20200424", "7.3.0"]).await;
    let settings = dirs.write_settings(&registry.url());

    run(&settings, &["check", "7.2.4"])
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains("Update available: 7.2.4 -> 7.2.5-20200424"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_check_up_to_date() {
    let dirs = TestDirs::new();
    let mut registry = TestRegistry::start().await;
    registry.publish_listing(&["7.2.4", "7.3.0"]).await;
    let settings = dirs.write_settings(&registry.url());

    run(&settings, &["check", "7.2.4"])
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is up to date (7.2.4)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_check_rejects_invalid_version() {
    let dirs = TestDirs::new();
    let registry = TestRegistry::start().await;
    let settings = dirs.write_settings(&registry.url());

    run(&settings, &["check", "not-a-version"])
        .await
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid version"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_install_then_status() {
    let dirs = TestDirs::new();
    let Some(archive) = real_bundle(&dirs, &[("config/app.json", r#"{"app":true}"#)]) else {
        return;
    };
    let mut registry = TestRegistry::start().await;
    registry.publish_bundle("1.2.4-20240101", archive).await;
    let settings = dirs.write_settings(&registry.url());

    run(&settings, &["install", "1.2.4-20240101"])
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed configuration 1.2.4-20240101"));

    assert_eq!(dirs.config_files(), vec!["app.json", "version"]);
    assert_eq!(dirs.workspace_count(), 0);

    run(&settings, &["status"])
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed: 1.2.4-20240101"))
        .stdout(predicate::str::contains("Package:   config-bundle"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_status_without_install() {
    let dirs = TestDirs::new();
    let registry = TestRegistry::start().await;
    let settings = dirs.write_settings(&registry.url());

    run(&settings, &["status"])
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed: none"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_update_without_stamp_fails() {
    let dirs = TestDirs::new();
    let registry = TestRegistry::start().await;
    let settings = dirs.write_settings(&registry.url());

    run(&settings, &["update"])
        .await
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("No installed configuration found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_update_dry_run_installs_nothing() {
    let dirs = TestDirs::new();
    let mut registry = TestRegistry::start().await;
    registry.publish_listing(&["2.0.0", "2.0.1-20240101"]).await;
    let settings = dirs.write_settings(&registry.url());

    run(&settings, &["update", "--current", "2.0.0", "--dry-run"])
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains("Would install: 2.0.0 -> 2.0.1-20240101"));

    assert!(!dirs.external.config_dir.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_install_fails_while_lock_is_held() {
    let dirs = TestDirs::new();
    let mut registry = TestRegistry::start().await;
    registry.publish_bundle("3.0.1-20240101", b"stub".to_vec()).await;
    let settings = dirs.write_settings(&registry.url());

    let _holder = UpdateLock::acquire(&dirs.external.cache_dir).await.unwrap();

    run(&settings, &["install", "3.0.1-20240101"])
        .await
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("already in progress"));

    assert!(!dirs.external.config_dir.exists());
    assert_eq!(dirs.workspace_count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_registry_unreachable() {
    let dirs = TestDirs::new();
    let settings = dirs.write_settings("http://127.0.0.1:9");

    run(&settings, &["check", "1.0.0"])
        .await
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Registry error"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_update_installs_from_stamp() {
    let dirs = TestDirs::new();
    let Some(archive) = real_bundle(&dirs, &[("config/app.json", r#"{"app":2}"#)]) else {
        return;
    };
    std::fs::create_dir_all(&dirs.external.config_dir).unwrap();
    std::fs::write(dirs.external.config_dir.join("version"), "2.0.0").unwrap();
    std::fs::write(dirs.external.config_dir.join("old.json"), "{}").unwrap();

    let mut registry = TestRegistry::start().await;
    registry.publish_listing(&["2.0.0", "2.0.1-20240101", "2.1.0"]).await;
    registry.publish_bundle("2.0.1-20240101", archive).await;
    let settings = dirs.write_settings(&registry.url());

    run(&settings, &["update"])
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated configuration: 2.0.0 -> 2.0.1-20240101"));

    assert_eq!(dirs.stamp().as_deref(), Some("2.0.1-20240101"));
    assert_eq!(dirs.config_files(), vec!["app.json", "version"]);
    assert_eq!(dirs.workspace_count(), 0);
}
