//! Show the installed configuration version.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::config::UpdaterConfig;
use crate::installer::read_installed_version;

/// Print the `version` stamp of the configuration directory.
#[derive(Args, Debug)]
pub struct StatusCommand {}

impl StatusCommand {
    /// Reads and prints the stamp.
    pub async fn execute(self, settings: &UpdaterConfig) -> Result<()> {
        let config_dir = settings.config_dir()?;

        println!("Package:   {}", settings.package);
        println!("Registry:  {}", settings.registry_url);
        println!("Directory: {}", config_dir.display());

        match read_installed_version(&config_dir).await? {
            Some(version) => println!("Installed: {}", version.to_string().green()),
            None => println!("Installed: {}", "none".yellow()),
        }

        Ok(())
    }
}
