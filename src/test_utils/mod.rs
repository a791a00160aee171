//! Test utilities for config-updater
//!
//! Shared by unit tests and the integration suite (via the `test-utils` feature):
//! - [`init_test_logging`] - one-time `tracing` setup that respects `RUST_LOG`
//! - [`StubExtractor`] - an [`Extractor`] that writes a fixed tree instead of unpacking
//! - [`ExtractGate`] - pauses a [`StubExtractor`] mid-install so tests can race installs
//! - [`versions_document`] / [`metadata_document`] - registry JSON payloads
//! - [`pack_bundle`] - builds a real `.tgz` bundle with the system `tar`

use crate::installer::Extractor;
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use std::path::Path;
use std::sync::{Arc, Once};
use tokio::sync::Notify;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// Rendezvous between a paused [`StubExtractor`] and the test driving it.
#[derive(Debug, Default)]
pub struct ExtractGate {
    entered: Notify,
    release: Notify,
}

impl ExtractGate {
    /// Creates a closed gate.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Waits until an extractor has reached the gate.
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Lets the waiting extractor continue.
    pub fn open(&self) {
        self.release.notify_one();
    }
}

/// Extractor that writes a fixed file tree into the destination.
///
/// Archive contents are ignored, so pipeline tests need no real tarball.
#[derive(Debug, Default, Clone)]
pub struct StubExtractor {
    files: Vec<(String, String)>,
    gate: Option<Arc<ExtractGate>>,
    fail_with: Option<String>,
}

impl StubExtractor {
    /// An extractor that produces an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file at `relative` (after the leading component is stripped).
    #[must_use]
    pub fn with_file(mut self, relative: &str, content: &str) -> Self {
        self.files.push((relative.to_string(), content.to_string()));
        self
    }

    /// Pauses at `gate` before writing anything.
    #[must_use]
    pub fn gated(mut self, gate: Arc<ExtractGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Fails every extraction with `message`.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }
}

impl Extractor for StubExtractor {
    fn extract<'a>(
        &'a self,
        _archive: &'a str,
        dest: &'a str,
        _strip_components: u32,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            if let Some(gate) = &self.gate {
                gate.entered.notify_one();
                gate.release.notified().await;
            }

            if let Some(message) = &self.fail_with {
                return Err(anyhow::anyhow!("{message}"));
            }

            for (relative, content) in &self.files {
                let path = Path::new(dest).join(relative);
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&path, content)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
            Ok(())
        })
    }
}

/// Registry package document listing `versions`.
#[must_use]
pub fn versions_document(package: &str, versions: &[&str]) -> String {
    let listing: serde_json::Map<String, serde_json::Value> = versions
        .iter()
        .map(|v| ((*v).to_string(), serde_json::json!({ "name": package, "version": v })))
        .collect();

    serde_json::json!({ "name": package, "versions": listing }).to_string()
}

/// Registry metadata document for one version pointing at `tarball`.
#[must_use]
pub fn metadata_document(package: &str, version: &str, tarball: &str) -> String {
    serde_json::json!({
        "name": package,
        "version": version,
        "dist": { "tarball": tarball }
    })
    .to_string()
}

/// Builds a gzip'd tarball at `dest` containing `files` under a `package/` folder.
///
/// Requires a system `tar`; `work_dir` is used for staging.
pub fn pack_bundle(work_dir: &Path, files: &[(&str, &str)], dest: &Path) -> Result<()> {
    let staging = work_dir.join("bundle-staging");
    crate::utils::remove_dir_all(&staging)?;
    let root = staging.join("package");
    std::fs::create_dir_all(&root)
        .with_context(|| format!("Failed to create {}", root.display()))?;

    for (relative, content) in files {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
    }

    let status = std::process::Command::new("tar")
        .arg("-czf")
        .arg(dest)
        .arg("-C")
        .arg(&staging)
        .arg("package")
        .status()
        .context("Failed to run tar")?;

    if !status.success() {
        anyhow::bail!("tar exited with {status}");
    }
    Ok(())
}
