//! Command-line interface for config-updater.
//!
//! # Commands
//!
//! - `check <CURRENT>` - report the newest compatible dated build for a version
//! - `install <VERSION>` - install one published bundle
//! - `update [--current <VERSION>]` - check from the installed stamp and install any update
//! - `status` - show the installed version stamp
//!
//! # Global Options
//!
//! Every command accepts `--verbose`/`--quiet` for log level, `--config` for an
//! alternative settings file, and `--registry`, `--package`, `--config-dir`,
//! `--cache-dir` to override individual settings. `RUST_LOG`, when set, takes
//! precedence over `--verbose` and `--quiet`.

use crate::config::UpdaterConfig;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod check;
mod common;
mod install;
mod status;
mod update;

pub use check::CheckCommand;
pub use install::InstallCommand;
pub use status::StatusCommand;
pub use update::UpdateCommand;

/// Runtime settings derived from the global flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Settings file given with `--config`
    pub config_path: Option<PathBuf>,
    /// Registry URL override
    pub registry: Option<String>,
    /// Package name override
    pub package: Option<String>,
    /// Configuration directory override
    pub config_dir: Option<String>,
    /// Cache directory override
    pub cache_dir: Option<String>,
}

impl CliConfig {
    /// Loads the settings file and applies the flag overrides on top.
    pub async fn load_settings(&self) -> Result<UpdaterConfig> {
        let mut settings = UpdaterConfig::load_with_optional(self.config_path.clone()).await?;
        self.apply_overrides(&mut settings);
        Ok(settings)
    }

    fn apply_overrides(&self, settings: &mut UpdaterConfig) {
        if let Some(registry) = &self.registry {
            settings.registry_url.clone_from(registry);
        }
        if let Some(package) = &self.package {
            settings.package.clone_from(package);
        }
        if let Some(dir) = &self.config_dir {
            settings.config_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.cache_dir {
            settings.cache_dir = Some(dir.clone());
        }
    }
}

/// Keeps a configuration bundle up to date from a package registry.
#[derive(Parser, Debug)]
#[command(
    name = "config-updater",
    about = "Check for and install configuration bundle updates",
    version,
    long_about = "config-updater looks up dated builds of a configuration bundle in a package registry and installs them into a local configuration directory, one install at a time per cache directory."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the settings file (default: ~/.config-updater/config.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Registry base URL
    #[arg(long, global = true, value_name = "URL")]
    registry: Option<String>,

    /// Configuration bundle package name
    #[arg(long, global = true, value_name = "NAME")]
    package: Option<String>,

    /// Live configuration directory
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<String>,

    /// Cache directory holding the update lock
    #[arg(long, global = true, value_name = "DIR")]
    cache_dir: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check the registry for a compatible update
    Check(CheckCommand),

    /// Install a specific bundle version
    Install(InstallCommand),

    /// Check for an update and install it
    Update(UpdateCommand),

    /// Show the installed bundle version
    Status(StatusCommand),
}

impl Cli {
    /// Initializes logging and runs the selected command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        init_logging(&config.log_level);
        self.execute_with_config(config).await
    }

    /// Translates the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        };

        CliConfig {
            log_level: log_level.to_string(),
            config_path: self.config.clone(),
            registry: self.registry.clone(),
            package: self.package.clone(),
            config_dir: self.config_dir.clone(),
            cache_dir: self.cache_dir.clone(),
        }
    }

    /// Runs the selected command with explicit settings; does not touch logging.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        let settings = config.load_settings().await?;

        match self.command {
            Commands::Check(cmd) => cmd.execute(&settings).await,
            Commands::Install(cmd) => cmd.execute(&settings).await,
            Commands::Update(cmd) => cmd.execute(&settings).await,
            Commands::Status(cmd) => cmd.execute(&settings).await,
        }
    }
}

/// Installs the global `tracing` subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `default_level`. Calling this more than once is harmless.
pub fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
