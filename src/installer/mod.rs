//! Installation of configuration bundles.
//!
//! [`InstallCoordinator`] is the only writer of the live configuration directory. It
//! downloads a published bundle into a private [`Workspace`], unpacks it, and replaces
//! the contents of `config_dir` with the bundle's `config/*.json` files, all while
//! holding the [`UpdateLock`] for `cache_dir`.
//!
//! # Install Process
//!
//! 1. **Resolve**: look up the bundle's tarball URL in the registry
//! 2. **Lock**: take the update lock; a concurrent install fails immediately
//! 3. **Workspace**: create `config-update-<uuid>` under the temp root
//! 4. **Download**: stream the tarball into the workspace
//! 5. **Extract**: unpack into a clean `extracted/`, stripping the top-level folder
//! 6. **Replace**: empty `config_dir`, copy the `.json` files, write the `version` stamp
//! 7. **Cleanup**: remove the workspace and release the lock
//!
//! Steps 2 through 7 run under two guards. The lock guard and the workspace clean up
//! when they go out of scope, so an early return from any step releases the lock and
//! removes the workspace without explicit cleanup code on each error path.
//!
//! # Failure Window
//!
//! Step 6 deletes the old contents before copying the new ones. If the process dies
//! between the two, `config_dir` is left empty or partially populated. Running the
//! install again repopulates it, since step 6 never trusts existing content.

use crate::cache::UpdateLock;
use crate::constants::{ARCHIVE_CONFIG_DIR, CONFIG_FILE_SUFFIX, VERSION_STAMP_FILE};
use crate::core::UpdateError;
use crate::registry::RegistryClient;
use crate::utils::{clean_dir, copy_files_filtered, write_text_file};
use anyhow::{Context, Result};
use semver::Version;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub mod extract;
pub mod workspace;

pub use extract::{Extractor, TarExtractor};
pub use workspace::Workspace;

/// Caller-owned directories an install reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalLocations {
    /// Live configuration directory, replaced wholesale by each install
    pub config_dir: PathBuf,
    /// Shared scratch directory hosting the update lock
    pub cache_dir: PathBuf,
}

impl ExternalLocations {
    /// Bundles the configuration and cache directories.
    pub fn new(config_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            cache_dir: cache_dir.into(),
        }
    }
}

/// Downloads, unpacks and installs configuration bundles.
///
/// # Example
///
/// ```rust,no_run
/// use config_updater::installer::{ExternalLocations, InstallCoordinator};
/// use config_updater::registry::RegistryClient;
///
/// # async fn example() -> Result<(), config_updater::core::UpdateError> {
/// let registry = RegistryClient::new("https://registry.npmjs.org", "config-bundle")?;
/// let coordinator = InstallCoordinator::new(registry);
/// let external = ExternalLocations::new("/srv/app/config", "/srv/app/cache");
///
/// coordinator.install("7.2.5-20200424", &external).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct InstallCoordinator {
    registry: RegistryClient,
    temp_root: PathBuf,
    extractor: Arc<dyn Extractor>,
}

impl std::fmt::Debug for InstallCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallCoordinator")
            .field("registry", &self.registry)
            .field("temp_root", &self.temp_root)
            .finish_non_exhaustive()
    }
}

impl InstallCoordinator {
    /// Creates a coordinator using the system temp directory and the system `tar`.
    #[must_use]
    pub fn new(registry: RegistryClient) -> Self {
        Self {
            registry,
            temp_root: std::env::temp_dir(),
            extractor: Arc::new(TarExtractor::new()),
        }
    }

    /// Places workspaces under `temp_root` instead of the system temp directory.
    #[must_use]
    pub fn with_temp_root(mut self, temp_root: impl Into<PathBuf>) -> Self {
        self.temp_root = temp_root.into();
        self
    }

    /// Replaces the archive extraction primitive.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Directory under which workspaces are created.
    #[must_use]
    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    /// Installs bundle `version` into `external.config_dir`.
    ///
    /// On success `config_dir` holds exactly the bundle's `.json` files plus a
    /// `version` stamp. On failure the lock is released, the workspace is removed
    /// best-effort, and `config_dir` is untouched unless the failure happened while
    /// replacing it.
    ///
    /// # Errors
    ///
    /// Every failure is reported as [`UpdateError::InstallFailed`], including a
    /// concurrent install holding the lock (see [`UpdateError::is_already_in_progress`]).
    pub async fn install(
        &self,
        version: &str,
        external: &ExternalLocations,
    ) -> Result<(), UpdateError> {
        info!(package = %self.registry.package(), %version, "Installing configuration bundle");

        let tarball = self.registry.fetch_tarball_url(version).await.map_err(|e| match e {
            UpdateError::InstallFailed {
                ..
            } => e,
            other => UpdateError::install_failed(format!(
                "Failed to resolve download URL for {version}: {other}"
            )),
        })?;
        debug!(%tarball, "Resolved bundle download URL");

        let lock =
            UpdateLock::acquire(&external.cache_dir).await.map_err(UpdateError::into_install_failed)?;

        // Declared after the lock so it is removed before the lock is released
        let workspace = Workspace::create(&self.temp_root).await?;

        workspace.fetch_into(&self.registry, &tarball).await?;

        let extracted = workspace.extract(self.extractor.as_ref()).await?;
        let source = extracted.join(ARCHIVE_CONFIG_DIR);
        if !source.is_dir() {
            return Err(UpdateError::install_failed(format!(
                "Bundle {version} has no {ARCHIVE_CONFIG_DIR}/ directory"
            )));
        }

        let config_dir = external.config_dir.clone();
        let stamp = version.to_string();
        let copied =
            tokio::task::spawn_blocking(move || replace_config_dir(&source, &config_dir, &stamp))
                .await
                .context("Replace task panicked")
                .and_then(|result| result)
                .map_err(|e| {
                    UpdateError::install_step("Failed to replace configuration directory", &e)
                })?;

        workspace.destroy().await;
        lock.release();

        info!(
            %version,
            files = copied.len(),
            config_dir = %external.config_dir.display(),
            "Configuration bundle installed"
        );
        Ok(())
    }
}

/// Empties `config_dir`, copies the `.json` files from `source`, and stamps `version`.
fn replace_config_dir(source: &Path, config_dir: &Path, version: &str) -> Result<Vec<PathBuf>> {
    clean_dir(config_dir)?;

    let copied = copy_files_filtered(source, config_dir, |name| name.ends_with(CONFIG_FILE_SUFFIX))?;
    debug!(files = copied.len(), "Copied configuration files");

    write_text_file(&config_dir.join(VERSION_STAMP_FILE), version)?;
    Ok(copied)
}

/// Reads the `version` stamp left in `config_dir` by the last successful install.
///
/// Returns `Ok(None)` when no stamp exists.
pub async fn read_installed_version(config_dir: &Path) -> Result<Option<Version>> {
    let stamp = config_dir.join(VERSION_STAMP_FILE);

    let content = match tokio::fs::read_to_string(&stamp).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", stamp.display()));
        }
    };

    let version = Version::parse(content.trim())
        .with_context(|| format!("{} does not contain a valid version", stamp.display()))?;
    Ok(Some(version))
}
