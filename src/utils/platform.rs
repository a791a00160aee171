//! Platform-specific helpers.
//!
//! Directory discovery follows platform conventions through the `dirs` crate, and
//! [`to_posix_path`] produces the path form handed to external POSIX tools.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Checks if the current platform is Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Checks whether an executable is available on `PATH`.
#[must_use]
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Converts a path into the forward-slash form expected by POSIX tools.
///
/// Backslashes become `/`, the Windows extended-length prefix (`\\?\`) is dropped, and a
/// leading drive letter (`C:`) is stripped. The conversion is purely textual and
/// behaves the same on every host.
///
/// # Examples
///
/// ```rust
/// use config_updater::utils::platform::to_posix_path;
/// use std::path::Path;
///
/// assert_eq!(to_posix_path(Path::new(r"C:\Users\me\AppData\Local\Temp\x")), "/Users/me/AppData/Local/Temp/x");
/// assert_eq!(to_posix_path(Path::new("/tmp/config-update-1/package.tgz")), "/tmp/config-update-1/package.tgz");
/// ```
#[must_use]
pub fn to_posix_path<P: AsRef<Path>>(path: P) -> String {
    let path_str = path.as_ref().to_string_lossy();

    let cleaned = if let Some(stripped) = path_str.strip_prefix(r"\\?\UNC\") {
        format!("//{stripped}")
    } else if let Some(stripped) = path_str.strip_prefix(r"\\?\") {
        stripped.to_string()
    } else {
        path_str.to_string()
    };

    let forward = cleaned.replace('\\', "/");

    let bytes = forward.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        forward[2..].to_string()
    } else {
        forward
    }
}

/// Expands `~` and environment variables (`$VAR`, `${VAR}`) in a user-supplied path.
///
/// # Errors
///
/// Fails when a referenced variable is undefined or the home directory is unknown.
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path).with_context(|| {
        let platform_vars = if is_windows() {
            "Common Windows variables: $USERPROFILE, $APPDATA, $TEMP"
        } else {
            "Common Unix variables: $HOME, $USER, $TMPDIR"
        };
        format!(
            "Failed to expand path: {path}\n\n\
            Undefined environment variables cannot be expanded (use $VAR or ${{VAR}}).\n\
            {platform_vars}"
        )
    })?;

    Ok(PathBuf::from(expanded.into_owned()))
}

/// Returns the platform cache directory for config-updater.
///
/// - **Linux**: `$XDG_CACHE_HOME/config-updater` or `$HOME/.cache/config-updater`
/// - **macOS**: `$HOME/Library/Caches/config-updater`
/// - **Windows**: `%LOCALAPPDATA%\config-updater`
pub fn get_cache_dir() -> Result<PathBuf> {
    dirs::cache_dir().map(|p| p.join("config-updater")).ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: Check that the LOCALAPPDATA environment variable is set"
        } else {
            "Check that the XDG_CACHE_HOME or HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine cache directory.\n\n{platform_help}")
    })
}

/// Returns the platform data directory for config-updater.
///
/// The default configuration directory lives below it.
pub fn get_data_dir() -> Result<PathBuf> {
    dirs::data_dir().map(|p| p.join("config-updater")).ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: Check that the APPDATA environment variable is set"
        } else {
            "Check that the XDG_DATA_HOME or HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine data directory.\n\n{platform_help}")
    })
}
