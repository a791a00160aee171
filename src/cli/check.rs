//! Check the registry for a compatible configuration update.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::CommandContext;
use crate::config::UpdaterConfig;

/// Report the newest dated build between a version and its next patch release.
///
/// ```bash
/// config-updater check 7.2.4
/// # Update available: 7.2.4 -> 7.2.5-20200424
/// ```
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Version to check from (e.g. "7.2.4")
    #[arg(value_name = "CURRENT")]
    pub current: String,
}

impl CheckCommand {
    /// Runs the check and prints the result.
    pub async fn execute(self, settings: &UpdaterConfig) -> Result<()> {
        let context = CommandContext::from_settings(settings)?;

        match context.resolver.check_for_update(&self.current).await? {
            Some(version) => {
                println!(
                    "{} {} -> {}",
                    "Update available:".green().bold(),
                    self.current,
                    version.to_string().cyan()
                );
            }
            None => println!("Configuration is up to date ({})", self.current),
        }

        Ok(())
    }
}
