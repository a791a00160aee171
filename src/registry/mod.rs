//! Package registry client.
//!
//! Speaks the read side of an npm-style registry API:
//!
//! ```text
//! GET {base}/{package}            -> { "versions": { "<version>": { ... }, ... } }
//! GET {base}/{package}/{version}  -> { "dist": { "tarball": "<url>" }, ... }
//! GET {tarball url}               -> gzip'd tar archive (streamed)
//! ```
//!
//! Failures while reading version listings are reported as [`UpdateError::Registry`]
//! tagged with whether the transport or the payload was at fault.

use crate::constants::{CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};
use crate::core::UpdateError;
use anyhow::{Context, Result};
use futures::StreamExt;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// HTTP client bound to one registry and one package.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: reqwest::Client,
    base_url: String,
    package: String,
}

impl RegistryClient {
    /// Creates a client with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Config`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, package: &str) -> Result<Self, UpdateError> {
        Self::with_timeout(base_url, package, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a client whose requests time out after `timeout`.
    pub fn with_timeout(
        base_url: &str,
        package: &str,
        timeout: Duration,
    ) -> Result<Self, UpdateError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(format!("config-updater/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpdateError::Config {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            package: package.to_string(),
        })
    }

    /// Name of the package this client queries.
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// URL of the package document listing all versions.
    #[must_use]
    pub fn package_url(&self) -> String {
        format!("{}/{}", self.base_url, encode_package_name(&self.package))
    }

    /// URL of the metadata document for one version.
    #[must_use]
    pub fn version_url(&self, version: &str) -> String {
        format!("{}/{}", self.package_url(), version)
    }

    /// Fetches every version string the registry lists for the package.
    ///
    /// Keys are returned as published; no filtering or parsing happens here.
    ///
    /// # Errors
    ///
    /// [`UpdateError::Registry`] with `Network` for transport failures and error
    /// statuses, `Malformed` for non-JSON payloads or a missing `versions` object.
    pub async fn fetch_versions(&self) -> Result<Vec<String>, UpdateError> {
        let url = self.package_url();
        let document = self.get_json(&url).await?;

        let versions = document.get("versions").and_then(Value::as_object).ok_or_else(|| {
            UpdateError::malformed(format!("{url} returned a document without a versions listing"))
        })?;

        debug!(package = %self.package, count = versions.len(), "Fetched version listing");
        Ok(versions.keys().cloned().collect())
    }

    /// Looks up the tarball URL for one published version.
    ///
    /// # Errors
    ///
    /// [`UpdateError::Registry`] when the metadata cannot be fetched or parsed,
    /// [`UpdateError::InstallFailed`] when `dist.tarball` is absent or not a string.
    pub async fn fetch_tarball_url(&self, version: &str) -> Result<String, UpdateError> {
        let url = self.version_url(version);
        let document = self.get_json(&url).await?;

        match document.pointer("/dist/tarball") {
            Some(Value::String(tarball)) => Ok(tarball.clone()),
            Some(other) => Err(UpdateError::install_failed(format!(
                "Tarball URL for {}@{version} is not a string: {other}",
                self.package
            ))),
            None => Err(UpdateError::install_failed(format!(
                "No tarball URL published for {}@{version}",
                self.package
            ))),
        }
    }

    /// Streams the body at `url` into a new file at `dest`.
    ///
    /// The body is written chunk by chunk, never buffered whole. Returns the number of
    /// bytes written.
    pub async fn download_to(&self, url: &str, dest: &Path) -> Result<u64> {
        debug!(%url, dest = %dest.display(), "Downloading artifact");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to request {url}"))?
            .error_for_status()
            .with_context(|| format!("Download of {url} was refused"))?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("Failed to create {}", dest.display()))?;

        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.with_context(|| format!("Failed while reading {url}"))?;
            file.write_all(&chunk)
                .await
                .with_context(|| format!("Failed to write {}", dest.display()))?;
            written += chunk.len() as u64;
        }

        file.flush().await.with_context(|| format!("Failed to flush {}", dest.display()))?;
        debug!(bytes = written, "Download complete");
        Ok(written)
    }

    async fn get_json(&self, url: &str) -> Result<Value, UpdateError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(%url, error = %e, "Registry request failed");
            UpdateError::network(format!("Failed to reach {url}: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "Registry returned an error status");
            return Err(UpdateError::network(format!("{url} returned HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| UpdateError::network(format!("Failed to read response from {url}: {e}")))?;

        serde_json::from_str(&body).map_err(|e| {
            warn!(%url, error = %e, "Registry returned a non-JSON payload");
            UpdateError::malformed(format!("{url} did not return a JSON document: {e}"))
        })
    }
}

/// Encodes a package name for use as a single URL path segment.
///
/// Scoped names keep their `@` but the scope separator is escaped, as registries
/// expect (`@scope/name` becomes `@scope%2Fname`).
fn encode_package_name(name: &str) -> String {
    name.replace('/', "%2F")
}
