//! File system helpers used by the install pipeline.
//!
//! These are the primitive operations the pipeline composes: ensure a directory,
//! delete a directory tree (tolerating absence), reset a directory to empty, write a
//! text file, and copy a filtered subset of a directory tree. All of them are
//! synchronous and return [`anyhow::Result`] with path context; async callers run
//! them on a blocking thread.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Ensures a directory exists, creating it and all parent directories if necessary.
///
/// # Errors
///
/// Fails if the path exists but is not a directory, or if creation fails.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Recursively removes a directory and all its contents.
///
/// A directory that does not exist is not an error.
pub fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => {
            Err(e).with_context(|| format!("Failed to remove directory: {}", path.display()))
        }
    }
}

/// Resets `path` to an empty directory: removes whatever is there, then recreates it.
pub fn clean_dir(path: &Path) -> Result<()> {
    remove_dir_all(path)?;
    ensure_dir(path)
}

/// Writes `content` to `path`, replacing any existing file.
pub fn write_text_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)
        .with_context(|| format!("Failed to write file: {}", path.display()))
}

/// Copies every regular file under `src` whose file name satisfies `filter` into `dst`,
/// preserving the relative directory layout.
///
/// Directories are only created in `dst` when they receive at least one file.
/// Symlinks are not followed. Returns the destination paths written, in walk order.
///
/// # Errors
///
/// Fails if `src` cannot be walked or any copy fails.
///
/// # Examples
///
/// ```rust,no_run
/// use config_updater::utils::fs::copy_files_filtered;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let copied = copy_files_filtered(Path::new("extracted/config"), Path::new("out"), |name| {
///     name.ends_with(".json")
/// })?;
/// println!("copied {} files", copied.len());
/// # Ok(())
/// # }
/// ```
pub fn copy_files_filtered<F>(src: &Path, dst: &Path, filter: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&str) -> bool,
{
    let mut copied = Vec::new();

    for entry in WalkDir::new(src).follow_links(false).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("Failed to read directory tree: {}", src.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !filter(&name) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(src)
            .with_context(|| format!("{} is outside {}", entry.path().display(), src.display()))?;
        let target = dst.join(relative);
        if let Some(parent) = target.parent() {
            ensure_dir(parent)?;
        }

        fs::copy(entry.path(), &target).with_context(|| {
            format!("Failed to copy file from {} to {}", entry.path().display(), target.display())
        })?;
        copied.push(target);
    }

    Ok(copied)
}
