//! Scratch directory for one install attempt.
//!
//! A [`Workspace`] is a uniquely named directory `config-update-<uuid>` under an
//! injected temp root. It holds the downloaded archive (`package.tgz`) and the
//! unpacked tree (`extracted/`). The workspace owns its directory: [`Workspace::destroy`]
//! removes it, and dropping the value without destroying it removes it as well.
//! Removal failures are logged and never reported.

use super::extract::Extractor;
use crate::constants::{
    ARCHIVE_FILE_NAME, ARCHIVE_STRIP_COMPONENTS, EXTRACTED_DIR, WORKSPACE_PREFIX,
};
use crate::core::UpdateError;
use crate::registry::RegistryClient;
use crate::utils::{clean_dir, remove_dir_all, to_posix_path};
use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Temporary directory holding one downloaded and extracted bundle.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    destroyed: bool,
}

impl Workspace {
    /// Creates a fresh workspace directory under `temp_root`.
    ///
    /// # Errors
    ///
    /// [`UpdateError::InstallFailed`] if the directory cannot be created.
    pub async fn create(temp_root: &Path) -> Result<Self, UpdateError> {
        let path = temp_root.join(format!("{WORKSPACE_PREFIX}-{}", uuid::Uuid::new_v4()));

        let created: anyhow::Result<()> = async {
            tokio::fs::create_dir_all(temp_root)
                .await
                .with_context(|| format!("Failed to create {}", temp_root.display()))?;
            tokio::fs::create_dir(&path)
                .await
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Ok(())
        }
        .await;
        created.map_err(|e| UpdateError::install_step("Failed to create workspace", &e))?;

        debug!(workspace = %path.display(), "Workspace created");
        Ok(Self {
            path,
            destroyed: false,
        })
    }

    /// Root directory of the workspace.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the downloaded archive is written.
    #[must_use]
    pub fn archive_path(&self) -> PathBuf {
        self.path.join(ARCHIVE_FILE_NAME)
    }

    /// Where the archive is unpacked.
    #[must_use]
    pub fn extracted_dir(&self) -> PathBuf {
        self.path.join(EXTRACTED_DIR)
    }

    /// Streams the artifact at `url` into the workspace and returns the archive path.
    ///
    /// # Errors
    ///
    /// [`UpdateError::InstallFailed`] naming the transport or write failure.
    pub async fn fetch_into(
        &self,
        registry: &RegistryClient,
        url: &str,
    ) -> Result<PathBuf, UpdateError> {
        let archive = self.archive_path();
        registry
            .download_to(url, &archive)
            .await
            .map_err(|e| UpdateError::install_step("Failed to download bundle", &e))?;
        Ok(archive)
    }

    /// Unpacks the downloaded archive into a clean `extracted/` directory.
    ///
    /// Any previous content of `extracted/` is removed first. One leading path
    /// component is stripped from the archive entries.
    ///
    /// # Errors
    ///
    /// [`UpdateError::InstallFailed`] if the directory cannot be reset or extraction fails.
    pub async fn extract(&self, extractor: &dyn Extractor) -> Result<PathBuf, UpdateError> {
        let archive = self.archive_path();
        let extracted = self.extracted_dir();

        let target = extracted.clone();
        tokio::task::spawn_blocking(move || clean_dir(&target))
            .await
            .context("Workspace cleanup task panicked")
            .and_then(|result| result)
            .map_err(|e| UpdateError::install_step("Failed to prepare extraction directory", &e))?;

        let archive_arg = to_posix_path(&archive);
        let dest_arg = to_posix_path(&extracted);
        debug!(archive = %archive_arg, dest = %dest_arg, "Extracting bundle");

        extractor
            .extract(&archive_arg, &dest_arg, ARCHIVE_STRIP_COMPONENTS)
            .await
            .map_err(|e| UpdateError::install_step("Failed to extract bundle", &e))?;

        Ok(extracted)
    }

    /// Removes the workspace directory. Failures are logged, never returned.
    pub async fn destroy(mut self) {
        self.destroyed = true;
        let path = self.path.clone();

        match tokio::task::spawn_blocking(move || remove_dir_all(&path)).await {
            Ok(Ok(())) => debug!(workspace = %self.path.display(), "Workspace removed"),
            Ok(Err(e)) => {
                warn!(workspace = %self.path.display(), error = %e, "Failed to remove workspace");
            }
            Err(e) => {
                warn!(workspace = %self.path.display(), error = %e, "Workspace removal task failed");
            }
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.destroyed {
            return;
        }
        if let Err(e) = remove_dir_all(&self.path) {
            warn!(workspace = %self.path.display(), error = %e, "Failed to remove workspace");
        }
    }
}
