//! Shared setup for CLI commands

use anyhow::Result;

use crate::config::UpdaterConfig;
use crate::installer::{ExternalLocations, InstallCoordinator};
use crate::version::VersionResolver;

/// Everything a command needs to check for or install updates
#[derive(Debug)]
pub struct CommandContext {
    /// Registry-backed version lookup
    pub resolver: VersionResolver,
    /// Install pipeline bound to the same registry
    pub coordinator: InstallCoordinator,
    /// Resolved configuration and cache directories
    pub external: ExternalLocations,
}

impl CommandContext {
    /// Builds the registry client, resolver and coordinator from settings
    pub fn from_settings(settings: &UpdaterConfig) -> Result<Self> {
        let registry = settings.registry_client()?;
        let coordinator =
            InstallCoordinator::new(registry.clone()).with_temp_root(settings.temp_dir()?);

        Ok(Self {
            resolver: VersionResolver::new(registry),
            coordinator,
            external: settings.external_locations()?,
        })
    }
}
