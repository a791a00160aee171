//! Global constants used throughout config-updater.
//!
//! File names and defaults that several modules must agree on live here so the
//! on-disk layout is defined in one place.

use std::time::Duration;

/// Name of the advisory lock file created inside the cache directory.
pub const LOCK_FILE_NAME: &str = "config-update.lock";

/// Name of the version stamp written at the root of the configuration directory.
pub const VERSION_STAMP_FILE: &str = "version";

/// Prefix of every workspace directory created under the temp root.
pub const WORKSPACE_PREFIX: &str = "config-update";

/// File name the downloaded archive is streamed into.
pub const ARCHIVE_FILE_NAME: &str = "package.tgz";

/// Subdirectory of a workspace the archive is unpacked into.
pub const EXTRACTED_DIR: &str = "extracted";

/// Directory inside the unpacked archive holding the configuration files.
pub const ARCHIVE_CONFIG_DIR: &str = "config";

/// Suffix a file must carry to be installed into the configuration directory.
pub const CONFIG_FILE_SUFFIX: &str = ".json";

/// Leading path components stripped during extraction. Registry tarballs wrap
/// their contents in a single top-level `package/` folder.
pub const ARCHIVE_STRIP_COMPONENTS: u32 = 1;

/// Default package registry.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Default name of the configuration package in the registry.
pub const DEFAULT_PACKAGE_NAME: &str = "config-bundle";

/// Default HTTP request timeout (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for establishing registry connections (10 seconds).
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
