//! Archive extraction primitive.
//!
//! The install pipeline unpacks bundles through the [`Extractor`] trait. The default
//! implementation, [`TarExtractor`], shells out to the system `tar`, which is why paths
//! reach it already normalized to POSIX form.

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use std::process::Stdio;
use tokio::process::Command;

/// Unpacks a gzip'd tar archive into a directory.
///
/// `archive` and `dest` are POSIX-style paths. `strip_components` leading path
/// components are removed from every entry, as with `tar --strip-components`.
pub trait Extractor: Send + Sync {
    /// Extracts `archive` into the existing directory `dest`.
    fn extract<'a>(
        &'a self,
        archive: &'a str,
        dest: &'a str,
        strip_components: u32,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Extracts archives by running the system `tar`.
#[derive(Debug, Clone)]
pub struct TarExtractor {
    program: String,
}

impl Default for TarExtractor {
    fn default() -> Self {
        Self {
            program: "tar".to_string(),
        }
    }
}

impl TarExtractor {
    /// Uses the `tar` found on `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a specific tar-compatible executable.
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(archive: &str, dest: &str, strip_components: u32) -> Vec<String> {
        vec![
            "-xzf".to_string(),
            archive.to_string(),
            "-C".to_string(),
            dest.to_string(),
            format!("--strip-components={strip_components}"),
        ]
    }
}

impl Extractor for TarExtractor {
    fn extract<'a>(
        &'a self,
        archive: &'a str,
        dest: &'a str,
        strip_components: u32,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let args = Self::args(archive, dest, strip_components);
            tracing::debug!(target: "extract", "Executing command: {} {}", self.program, args.join(" "));

            let output = Command::new(&self.program)
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output()
                .await
                .with_context(|| format!("Failed to run {}", self.program))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(anyhow::anyhow!(
                    "{} exited with status {:?} while extracting {archive}: {}",
                    self.program,
                    output.status.code(),
                    stderr.trim()
                ));
            }

            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                tracing::debug!(target: "extract", "{}", stderr.trim());
            }
            Ok(())
        })
    }
}
