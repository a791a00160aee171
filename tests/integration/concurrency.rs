//! Racing installs against a shared cache directory

use config_updater::cache::UpdateLock;
use config_updater::core::UpdateError;
use config_updater::installer::InstallCoordinator;
use config_updater::test_utils::{ExtractGate, StubExtractor};
use config_updater::version::VersionResolver;
use semver::Version;
use std::sync::Arc;

use crate::common::{TestDirs, TestRegistry};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_second_install_fails_while_first_holds_lock() {
    let dirs = TestDirs::new();
    let mut registry = TestRegistry::start().await;
    registry.publish_bundle("6.0.1-20240101", b"stub".to_vec()).await;
    registry.publish_bundle("6.0.1-20240202", b"stub".to_vec()).await;

    let gate = ExtractGate::new();
    let first = InstallCoordinator::new(registry.client())
        .with_temp_root(&dirs.temp_root)
        .with_extractor(Arc::new(
            StubExtractor::new().with_file("config/first.json", "{}").gated(gate.clone()),
        ));
    let second = InstallCoordinator::new(registry.client())
        .with_temp_root(&dirs.temp_root)
        .with_extractor(Arc::new(StubExtractor::new().with_file("config/second.json", "{}")));

    let external = dirs.external.clone();
    let running = tokio::spawn(async move { first.install("6.0.1-20240101", &external).await });

    // First install is parked inside extraction with the lock held
    gate.wait_entered().await;
    assert_eq!(dirs.workspace_count(), 1);

    let err = second.install("6.0.1-20240202", &dirs.external).await.unwrap_err();
    assert!(matches!(err, UpdateError::InstallFailed { .. }), "got {err:?}");
    assert!(err.is_already_in_progress());
    assert_eq!(dirs.workspace_count(), 1);

    gate.open();
    running.await.unwrap().unwrap();

    assert_eq!(dirs.config_files(), vec!["first.json", "version"]);
    assert_eq!(dirs.stamp().as_deref(), Some("6.0.1-20240101"));
    assert_eq!(dirs.workspace_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_checks_run_while_install_holds_lock() {
    let dirs = TestDirs::new();
    let mut registry = TestRegistry::start().await;
    registry.publish_listing(&["8.1.0", "8.1.1-20240101"]).await;
    registry.publish_bundle("8.1.1-20240101", b"stub".to_vec()).await;

    let gate = ExtractGate::new();
    let coordinator = InstallCoordinator::new(registry.client())
        .with_temp_root(&dirs.temp_root)
        .with_extractor(Arc::new(
            StubExtractor::new().with_file("config/a.json", "{}").gated(gate.clone()),
        ));

    let external = dirs.external.clone();
    let running =
        tokio::spawn(async move { coordinator.install("8.1.1-20240101", &external).await });
    gate.wait_entered().await;

    let resolver = VersionResolver::new(registry.client());
    assert_eq!(
        resolver.check_for_update("8.1.0").await.unwrap(),
        Some(Version::parse("8.1.1-20240101").unwrap())
    );

    gate.open();
    running.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_install_fails_while_external_holder_has_lock() {
    let dirs = TestDirs::new();
    std::fs::create_dir_all(&dirs.external.config_dir).unwrap();
    std::fs::write(dirs.external.config_dir.join("keep.json"), "{}").unwrap();

    let mut registry = TestRegistry::start().await;
    registry.publish_bundle("9.0.1-20240101", b"stub".to_vec()).await;

    let holder = UpdateLock::acquire(&dirs.external.cache_dir).await.unwrap();

    let coordinator = InstallCoordinator::new(registry.client())
        .with_temp_root(&dirs.temp_root)
        .with_extractor(Arc::new(StubExtractor::new().with_file("config/a.json", "{}")));
    let err = coordinator.install("9.0.1-20240101", &dirs.external).await.unwrap_err();

    assert!(err.is_already_in_progress());
    assert_eq!(dirs.config_files(), vec!["keep.json"]);
    assert_eq!(dirs.workspace_count(), 0);

    holder.release();
    coordinator.install("9.0.1-20240101", &dirs.external).await.unwrap();
    assert_eq!(dirs.config_files(), vec!["a.json", "version"]);
}
