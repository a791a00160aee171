//! Install one published configuration bundle.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::CommandContext;
use crate::config::UpdaterConfig;

/// Download and install a specific bundle version into the configuration directory.
///
/// Fails immediately if another install holds the lock for the same cache directory.
#[derive(Args, Debug)]
pub struct InstallCommand {
    /// Version to install (e.g. "7.2.5-20200424")
    #[arg(value_name = "VERSION")]
    pub version: String,
}

impl InstallCommand {
    /// Runs the install.
    pub async fn execute(self, settings: &UpdaterConfig) -> Result<()> {
        let context = CommandContext::from_settings(settings)?;

        context.coordinator.install(&self.version, &context.external).await?;

        println!(
            "{} configuration {} into {}",
            "Installed".green().bold(),
            self.version.cyan(),
            context.external.config_dir.display()
        );
        Ok(())
    }
}
