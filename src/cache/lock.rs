//! Advisory lock serializing installs that share a cache directory.
//!
//! The lock is an OS-level exclusive file lock (via [`fs4`]) on
//! `{cache_dir}/config-update.lock`. It is held for the lifetime of an [`UpdateLock`]
//! value and released when that value is released or dropped, so every exit path of an
//! install gives the lock back, including early returns and panics.
//!
//! # Contention
//!
//! Acquisition makes a single non-blocking attempt. If another process (or another
//! task in this process) holds the lock, [`UpdateLock::acquire`] returns
//! [`UpdateError::AlreadyInProgress`] immediately; concurrent installs are rejected,
//! not queued.
//!
//! # Stale Locks
//!
//! OS advisory locks belong to the open file handle, so the kernel drops them when the
//! holding process exits for any reason. A lock file left behind by a crashed installer
//! is therefore just an unlocked file and the next acquisition reuses it.
//!
//! # Compromise
//!
//! If the lock file is deleted or replaced while held, the lock no longer protects
//! anything. This is detected on release, logged at `warn`, and otherwise ignored.
//! Release never fails.

use crate::constants::LOCK_FILE_NAME;
use crate::core::UpdateError;
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// An exclusively held update lock for one cache directory.
///
/// # Example
///
/// ```rust,no_run
/// use config_updater::cache::lock::UpdateLock;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), config_updater::core::UpdateError> {
/// let lock = UpdateLock::acquire(Path::new("/var/cache/my-app")).await?;
/// // ... mutate shared directories ...
/// lock.release();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct UpdateLock {
    /// Open handle carrying the OS lock; `None` once released
    file: Option<File>,
    /// Path of the lock file
    path: PathBuf,
}

impl UpdateLock {
    /// Returns the lock file path for a cache directory.
    #[must_use]
    pub fn lock_path(cache_dir: &Path) -> PathBuf {
        cache_dir.join(LOCK_FILE_NAME)
    }

    /// Attempts to take the update lock for `cache_dir` without waiting.
    ///
    /// Creates `cache_dir` when it does not exist yet. The lock file is opened without
    /// truncation and is never deleted, so all cooperating processes always lock the
    /// same inode.
    ///
    /// # Errors
    ///
    /// - [`UpdateError::AlreadyInProgress`] if another holder has the lock
    /// - [`UpdateError::InstallFailed`] if the directory or lock file cannot be created
    pub async fn acquire(cache_dir: &Path) -> Result<Self, UpdateError> {
        tokio::fs::create_dir_all(cache_dir).await.map_err(|e| {
            UpdateError::install_failed(format!(
                "Failed to create cache directory {}: {e}",
                cache_dir.display()
            ))
        })?;

        let lock_path = Self::lock_path(cache_dir);
        let open_path = lock_path.clone();

        let attempt = tokio::task::spawn_blocking(move || -> std::io::Result<Option<File>> {
            let file = OpenOptions::new().create(true).write(true).truncate(false).open(&open_path)?;
            if file.try_lock_exclusive()? {
                Ok(Some(file))
            } else {
                Ok(None)
            }
        })
        .await
        .map_err(|e| UpdateError::install_failed(format!("Lock task panicked: {e}")))?;

        match attempt {
            Ok(Some(file)) => {
                debug!(lock = %lock_path.display(), "Update lock acquired");
                Ok(Self {
                    file: Some(file),
                    path: lock_path,
                })
            }
            Ok(None) => {
                debug!(lock = %lock_path.display(), "Update lock is held elsewhere");
                Err(UpdateError::AlreadyInProgress {
                    lock_path: lock_path.display().to_string(),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                Err(UpdateError::AlreadyInProgress {
                    lock_path: lock_path.display().to_string(),
                })
            }
            Err(e) => Err(UpdateError::install_failed(format!(
                "Failed to lock {}: {e}",
                lock_path.display()
            ))),
        }
    }

    /// Path of the lock file this guard holds.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this guard still holds the lock.
    #[must_use]
    pub const fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Releases the lock. Equivalent to dropping the guard.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };

        if let Some(reason) = compromise_reason(&self.path, &file) {
            warn!(lock = %self.path.display(), %reason, "Update lock was compromised while held");
        }

        match FileExt::unlock(&file) {
            Ok(()) => debug!(lock = %self.path.display(), "Update lock released"),
            Err(e) => {
                warn!(lock = %self.path.display(), error = %e, "Failed to unlock update lock");
            }
        }
    }
}

impl Drop for UpdateLock {
    fn drop(&mut self) {
        self.release_inner();
    }
}

/// Reports why the lock file on disk no longer matches the locked handle, if it doesn't.
fn compromise_reason(path: &Path, file: &File) -> Option<String> {
    let on_disk = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Some("lock file was removed".to_string());
        }
        Err(e) => return Some(format!("lock file is unreadable: {e}")),
    };

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;

        if let Ok(held) = file.metadata()
            && (held.dev() != on_disk.dev() || held.ino() != on_disk.ino())
        {
            return Some("lock file was replaced".to_string());
        }
    }

    #[cfg(not(unix))]
    let _ = (file, on_disk);

    None
}
