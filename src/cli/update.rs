//! Check for an update and install it in one step.

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use tracing::debug;

use super::common::CommandContext;
use crate::config::UpdaterConfig;
use crate::installer::read_installed_version;

/// Update the installed configuration to the newest compatible dated build.
///
/// The current version comes from the `version` stamp in the configuration directory
/// unless `--current` is given.
#[derive(Args, Debug)]
pub struct UpdateCommand {
    /// Version to update from instead of the installed stamp
    #[arg(long, value_name = "VERSION")]
    pub current: Option<String>,

    /// Only report what would be installed
    #[arg(long)]
    pub dry_run: bool,
}

impl UpdateCommand {
    /// Runs the check and, when an update exists, the install.
    pub async fn execute(self, settings: &UpdaterConfig) -> Result<()> {
        let context = CommandContext::from_settings(settings)?;

        let current = match self.current {
            Some(current) => current,
            None => match read_installed_version(&context.external.config_dir).await? {
                Some(installed) => installed.to_string(),
                None => bail!(
                    "No installed configuration found in {}. Pass --current <VERSION> or run `config-updater install <VERSION>` first.",
                    context.external.config_dir.display()
                ),
            },
        };
        debug!(%current, "Updating configuration");

        let Some(version) = context.resolver.check_for_update(&current).await? else {
            println!("Configuration is up to date ({current})");
            return Ok(());
        };

        if self.dry_run {
            println!("{} {current} -> {}", "Would install:".yellow().bold(), version.to_string().cyan());
            return Ok(());
        }

        let version = version.to_string();
        context.coordinator.install(&version, &context.external).await?;

        println!("{} {current} -> {}", "Updated configuration:".green().bold(), version.cyan());
        Ok(())
    }
}
