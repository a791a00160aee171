//! Common test utilities and fixtures for config-updater integration tests
//!
//! - [`TestRegistry`] - a mockito server speaking the registry API for one package
//! - [`TestDirs`] - sandboxed configuration, cache, and workspace directories

// Allow dead code because these utilities are used across different test files
// and not all utilities are used in every test file
#![allow(dead_code)]

use config_updater::installer::ExternalLocations;
use config_updater::registry::RegistryClient;
use config_updater::test_utils::{metadata_document, versions_document};
use mockito::{Mock, Server, ServerGuard};
use std::path::PathBuf;
use tempfile::TempDir;

/// Package name used throughout the suite
pub const PACKAGE: &str = "config-bundle";

/// Mock registry serving one package.
///
/// Mocks stay registered for the lifetime of this value.
pub struct TestRegistry {
    server: ServerGuard,
    mocks: Vec<Mock>,
}

impl TestRegistry {
    /// Starts a registry on its own server thread.
    pub async fn start() -> Self {
        Self {
            server: Server::new_async().await,
            mocks: Vec::new(),
        }
    }

    /// Base URL to configure clients with.
    pub fn url(&self) -> String {
        self.server.url()
    }

    /// A client for [`PACKAGE`] on this registry.
    pub fn client(&self) -> RegistryClient {
        RegistryClient::new(&self.url(), PACKAGE).unwrap()
    }

    fn tarball_path(version: &str) -> String {
        format!("/tarballs/{PACKAGE}-{version}.tgz")
    }

    /// Serves the package document listing `versions`.
    pub async fn publish_listing(&mut self, versions: &[&str]) {
        let mock = self
            .server
            .mock("GET", format!("/{PACKAGE}").as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(versions_document(PACKAGE, versions))
            .create_async()
            .await;
        self.mocks.push(mock);
    }

    /// Serves metadata for `version` and `archive` as its tarball.
    pub async fn publish_bundle(&mut self, version: &str, archive: Vec<u8>) {
        let tarball = format!("{}{}", self.url(), Self::tarball_path(version));
        let metadata = self
            .server
            .mock("GET", format!("/{PACKAGE}/{version}").as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(metadata_document(PACKAGE, version, &tarball))
            .create_async()
            .await;
        let archive = self
            .server
            .mock("GET", Self::tarball_path(version).as_str())
            .with_status(200)
            .with_header("content-type", "application/octet-stream")
            .with_body(archive)
            .create_async()
            .await;
        self.mocks.push(metadata);
        self.mocks.push(archive);
    }

    /// Serves metadata for `version` whose tarball download fails with `status`.
    pub async fn publish_broken_bundle(&mut self, version: &str, status: usize) {
        let tarball = format!("{}{}", self.url(), Self::tarball_path(version));
        let metadata = self
            .server
            .mock("GET", format!("/{PACKAGE}/{version}").as_str())
            .with_status(200)
            .with_body(metadata_document(PACKAGE, version, &tarball))
            .create_async()
            .await;
        let archive = self
            .server
            .mock("GET", Self::tarball_path(version).as_str())
            .with_status(status)
            .create_async()
            .await;
        self.mocks.push(metadata);
        self.mocks.push(archive);
    }

    /// Serves `body` with `status` for the package document.
    pub async fn respond_to_listing(&mut self, status: usize, body: &str) {
        let mock = self
            .server
            .mock("GET", format!("/{PACKAGE}").as_str())
            .with_status(status)
            .with_body(body)
            .create_async()
            .await;
        self.mocks.push(mock);
    }

    /// Serves `body` for the metadata of `version`.
    pub async fn respond_to_metadata(&mut self, version: &str, body: &str) {
        let mock = self
            .server
            .mock("GET", format!("/{PACKAGE}/{version}").as_str())
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;
        self.mocks.push(mock);
    }
}

/// Sandboxed directories for one test.
pub struct TestDirs {
    _temp: TempDir,
    /// Root of the sandbox
    pub root: PathBuf,
    /// Configuration and cache directories handed to installs
    pub external: ExternalLocations,
    /// Workspace root handed to the coordinator
    pub temp_root: PathBuf,
}

impl TestDirs {
    /// Creates an empty sandbox; the config and cache directories do not exist yet.
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let temp_root = root.join("tmp");
        std::fs::create_dir_all(&temp_root).unwrap();

        Self {
            external: ExternalLocations::new(root.join("config"), root.join("cache")),
            temp_root,
            root,
            _temp: temp,
        }
    }

    /// Number of install workspaces currently on disk.
    pub fn workspace_count(&self) -> usize {
        std::fs::read_dir(&self.temp_root)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|e| e.file_name().to_string_lossy().starts_with("config-update-"))
                    .count()
            })
            .unwrap_or(0)
    }

    /// Files under the configuration directory, as sorted `/`-separated relative paths.
    pub fn config_files(&self) -> Vec<String> {
        let base = &self.external.config_dir;
        if !base.exists() {
            return Vec::new();
        }
        let mut files: Vec<String> = walkdir::WalkDir::new(base)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().strip_prefix(base).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        files.sort();
        files
    }

    /// Contents of the `version` stamp.
    pub fn stamp(&self) -> Option<String> {
        std::fs::read_to_string(self.external.config_dir.join("version")).ok()
    }

    /// Writes a settings file pointing the CLI at this sandbox and `registry_url`.
    pub fn write_settings(&self, registry_url: &str) -> PathBuf {
        let path = self.root.join("settings.toml");
        let settings = format!(
            "registry_url = {registry_url:?}\npackage = {PACKAGE:?}\nconfig_dir = {:?}\ncache_dir = {:?}\ntemp_dir = {:?}\nrequest_timeout_secs = 10\n",
            self.external.config_dir.to_string_lossy(),
            self.external.cache_dir.to_string_lossy(),
            self.temp_root.to_string_lossy(),
        );
        std::fs::write(&path, settings).unwrap();
        path
    }
}

/// Builds a real bundle archive, or `None` when no system `tar` is available.
pub fn real_bundle(dirs: &TestDirs, files: &[(&str, &str)]) -> Option<Vec<u8>> {
    if !config_updater::utils::command_exists("tar") {
        eprintln!("Skipping: tar not found on PATH");
        return None;
    }

    let archive = dirs.root.join("bundle.tgz");
    config_updater::test_utils::pack_bundle(&dirs.root, files, &archive).unwrap();
    Some(std::fs::read(archive).unwrap())
}
