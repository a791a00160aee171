//! Update discovery for the configuration bundle.
//!
//! Published bundles that are eligible as updates carry a dated prerelease tag, an
//! eight digit date such as `7.2.5-20200424`. An installed version `v` may move to any
//! dated build strictly between `v` and the next patch release of `v`:
//!
//! ```text
//! current 7.2.4
//! window  (7.2.4, 7.2.5)
//! listing 7.2.5-20200101, 7.2.5-20200424, 7.3.0
//! result  7.2.5-20200424
//! ```
//!
//! Stable releases are never offered, even when they fall inside the window.

use crate::core::UpdateError;
use crate::registry::RegistryClient;
use regex::Regex;
use semver::{BuildMetadata, Prerelease, Version};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Parses a caller-supplied version, rejecting anything that is not semver.
pub fn parse_version(input: &str) -> Result<Version, UpdateError> {
    Version::parse(input.trim()).map_err(|e| UpdateError::InvalidVersion {
        version: input.to_string(),
        reason: e.to_string(),
    })
}

/// Whether `version`'s prerelease tag ends in an eight digit date.
///
/// The date is either the whole tag (`7.2.5-20200424`) or its last hyphenated part
/// (`7.2.5-rc-20200424`). A date in a dot-separated identifier (`beta.20200424`) does
/// not count. Build metadata is ignored.
#[must_use]
pub fn is_dated_prerelease(version: &Version) -> bool {
    static DATED: OnceLock<Option<Regex>> = OnceLock::new();

    DATED
        .get_or_init(|| Regex::new(r"(?:^|-)[0-9]{8}$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(version.pre.as_str()))
}

/// The next stable patch release after `version`.
///
/// A stable `1.2.3` becomes `1.2.4`. A prerelease already precedes its own patch
/// release, so `1.2.3-20200101` becomes `1.2.3`. Build metadata is dropped.
#[must_use]
pub fn next_patch(version: &Version) -> Version {
    let patch = if version.pre.is_empty() { version.patch + 1 } else { version.patch };

    Version {
        major: version.major,
        minor: version.minor,
        patch,
        pre: Prerelease::EMPTY,
        build: BuildMetadata::EMPTY,
    }
}

/// Open interval of versions an installed bundle may update to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRange {
    lower: Version,
    upper: Version,
}

impl UpdateRange {
    /// The window `(current, next_patch(current))`.
    #[must_use]
    pub fn for_version(current: &Version) -> Self {
        Self {
            lower: current.clone(),
            upper: next_patch(current),
        }
    }

    /// Exclusive lower bound.
    #[must_use]
    pub const fn lower(&self) -> &Version {
        &self.lower
    }

    /// Exclusive upper bound.
    #[must_use]
    pub const fn upper(&self) -> &Version {
        &self.upper
    }

    /// Strict membership on both ends by semver precedence.
    ///
    /// Build metadata has no precedence, so `7.2.5-20200424+rebuild` is not above
    /// `7.2.5-20200424`.
    #[must_use]
    pub fn contains(&self, version: &Version) -> bool {
        version.cmp_precedence(&self.lower).is_gt() && version.cmp_precedence(&self.upper).is_lt()
    }
}

/// Picks the highest dated prerelease inside `range` from raw registry keys.
///
/// Keys that do not parse as semver are skipped. Candidates are ranked by precedence;
/// build metadata only breaks ties.
pub fn select_update<I, S>(candidates: I, range: &UpdateRange) -> Option<Version>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    candidates
        .into_iter()
        .filter_map(|raw| Version::parse(raw.as_ref()).ok())
        .filter(is_dated_prerelease)
        .filter(|v| range.contains(v))
        .max_by(|a, b| a.cmp_precedence(b).then_with(|| a.cmp(b)))
}

/// Checks the registry for a newer compatible configuration bundle.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    registry: RegistryClient,
}

impl VersionResolver {
    /// Creates a resolver that queries `registry`.
    #[must_use]
    pub const fn new(registry: RegistryClient) -> Self {
        Self {
            registry,
        }
    }

    /// The registry this resolver queries.
    #[must_use]
    pub const fn registry(&self) -> &RegistryClient {
        &self.registry
    }

    /// Returns the best update for `current`, or `None` when nothing qualifies.
    ///
    /// Read-only and lock-free; concurrent checks are independent.
    ///
    /// # Errors
    ///
    /// - [`UpdateError::InvalidVersion`] if `current` is not semver (no request is made)
    /// - [`UpdateError::Registry`] if the listing cannot be fetched or understood
    pub async fn check_for_update(&self, current: &str) -> Result<Option<Version>, UpdateError> {
        let current = parse_version(current)?;
        let range = UpdateRange::for_version(&current);
        debug!(
            package = %self.registry.package(),
            lower = %range.lower(),
            upper = %range.upper(),
            "Checking for configuration update"
        );

        let listing = self.registry.fetch_versions().await?;
        let update = select_update(&listing, &range);

        match &update {
            Some(version) => info!(%current, %version, "Configuration update available"),
            None => debug!(%current, candidates = listing.len(), "No configuration update available"),
        }

        Ok(update)
    }
}
