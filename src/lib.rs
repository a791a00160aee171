//! config-updater - registry-driven configuration bundle updates
//!
//! Looks up dated builds of a configuration bundle in an npm-style package registry
//! and installs them into a local configuration directory. Installs may be launched
//! from several processes sharing the same directories; an advisory lock ensures only
//! one of them mutates the configuration at a time.
//!
//! # Architecture Overview
//!
//! Components, leaves first:
//!
//! - [`version`] - [`VersionResolver`](version::VersionResolver) filters the registry's
//!   version listing to dated prereleases (`7.2.5-20200424`) and picks the highest one
//!   strictly between the current version and its next patch release
//! - [`cache`] - [`UpdateLock`](cache::UpdateLock), a non-blocking exclusive file lock
//!   in the cache directory, released on every exit path
//! - [`installer`] - [`Workspace`](installer::Workspace), a scratch directory for the
//!   download and extraction, and [`InstallCoordinator`](installer::InstallCoordinator),
//!   which runs the whole install under the lock
//!
//! Supporting modules:
//!
//! - [`registry`] - HTTP client for version listings, metadata, and tarball downloads
//! - [`config`] - TOML settings file with path expansion
//! - [`core`] - [`UpdateError`](core::UpdateError) and CLI error rendering
//! - [`utils`] - filesystem primitives and platform helpers
//! - [`cli`] - the `config-updater` command
//!
//! # Example
//!
//! ```rust,no_run
//! use config_updater::installer::{ExternalLocations, InstallCoordinator};
//! use config_updater::registry::RegistryClient;
//! use config_updater::version::VersionResolver;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let registry = RegistryClient::new("https://registry.npmjs.org", "config-bundle")?;
//! let external = ExternalLocations::new("/srv/app/config", "/srv/app/cache");
//!
//! let resolver = VersionResolver::new(registry.clone());
//! if let Some(version) = resolver.check_for_update("7.2.4").await? {
//!     InstallCoordinator::new(registry).install(&version.to_string(), &external).await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Command Line
//!
//! ```bash
//! config-updater check 7.2.4
//! config-updater install 7.2.5-20200424 --config-dir /srv/app/config
//! config-updater update
//! config-updater status
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod installer;
pub mod registry;
pub mod utils;
pub mod version;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
