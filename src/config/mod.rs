//! User configuration for config-updater.
//!
//! Settings live in a TOML file, by default `~/.config-updater/config.toml`
//! (`%LOCALAPPDATA%\config-updater\config.toml` on Windows). The location can be
//! overridden with the `CONFIG_UPDATER_CONFIG` environment variable or the `--config`
//! flag. A missing file means defaults for every field.
//!
//! # File Format
//!
//! ```toml
//! registry_url = "https://registry.npmjs.org"
//! package = "@acme/service-config"
//! config_dir = "~/.local/share/acme/config"
//! cache_dir = "$XDG_CACHE_HOME/acme"
//! temp_dir = "/var/tmp"
//! request_timeout_secs = 60
//! ```
//!
//! Path values go through `~` and environment variable expansion.

use crate::constants::{DEFAULT_PACKAGE_NAME, DEFAULT_REGISTRY_URL, DEFAULT_REQUEST_TIMEOUT};
use crate::core::UpdateError;
use crate::installer::ExternalLocations;
use crate::registry::RegistryClient;
use crate::utils::{get_cache_dir, get_data_dir, resolve_path};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

/// Environment variable naming an alternative configuration file.
pub const CONFIG_PATH_ENV: &str = "CONFIG_UPDATER_CONFIG";

/// Settings for registry access and the directories an install touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Base URL of the package registry
    pub registry_url: String,

    /// Name of the configuration bundle package
    pub package: String,

    /// Live configuration directory; defaults under the platform data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_dir: Option<String>,

    /// Cache directory hosting the update lock; defaults to the platform cache directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,

    /// Root for install workspaces; defaults to the system temp directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<String>,

    /// Per-request HTTP timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            package: DEFAULT_PACKAGE_NAME.to_string(),
            config_dir: None,
            cache_dir: None,
            temp_dir: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
        }
    }
}

impl UpdaterConfig {
    /// Loads from `CONFIG_UPDATER_CONFIG` or the default path, falling back to defaults.
    pub async fn load() -> Result<Self> {
        Self::load_with_optional(None).await
    }

    /// Loads from `path` if given, else from the default location.
    ///
    /// A file that does not exist yields the defaults.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };

        if path.exists() {
            Self::load_from(&path).await
        } else {
            debug!(path = %path.display(), "No configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Loads from a specific file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// The configuration file location, honoring `CONFIG_UPDATER_CONFIG`.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV)
            && !path.is_empty()
        {
            return Ok(PathBuf::from(path));
        }

        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("config-updater")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".config-updater")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Resolved live configuration directory.
    pub fn config_dir(&self) -> Result<PathBuf> {
        match &self.config_dir {
            Some(dir) => resolve_path(dir),
            None => Ok(get_data_dir()?.join("config")),
        }
    }

    /// Resolved cache directory.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => resolve_path(dir),
            None => get_cache_dir(),
        }
    }

    /// Resolved workspace root.
    pub fn temp_dir(&self) -> Result<PathBuf> {
        match &self.temp_dir {
            Some(dir) => resolve_path(dir),
            None => Ok(std::env::temp_dir()),
        }
    }

    /// HTTP timeout per request.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The configuration and cache directories as one value.
    pub fn external_locations(&self) -> Result<ExternalLocations> {
        Ok(ExternalLocations::new(self.config_dir()?, self.cache_dir()?))
    }

    /// A registry client for the configured registry and package.
    pub fn registry_client(&self) -> Result<RegistryClient, UpdateError> {
        RegistryClient::with_timeout(&self.registry_url, &self.package, self.request_timeout())
    }
}
