//! Error handling for config-updater
//!
//! Two layers, as in the rest of the crate:
//! 1. [`UpdateError`] - the typed error returned by the public pipeline entry points.
//!    Callers branch on the variant, never on message text.
//! 2. [`ErrorContext`] - a presentation wrapper adding details and suggestions for
//!    the command-line front end.
//!
//! # Error Kinds
//!
//! - [`UpdateError::Registry`] - the version check could not talk to the registry, or the
//!   registry answered with something that is not a version listing
//! - [`UpdateError::InstallFailed`] - any failure inside `install`: missing tarball URL,
//!   lock already held, workspace, download, extraction, or replace failures
//! - [`UpdateError::AlreadyInProgress`] - raised by the update lock itself; the install
//!   coordinator folds it into `InstallFailed`
//! - [`UpdateError::InvalidVersion`] - a caller-supplied version is not valid semver
//! - [`UpdateError::Config`] - the configuration file could not be loaded
//! - [`UpdateError::Other`] - any other failure surfaced to the CLI, shown as its cause chain
//!
//! # Examples
//!
//! ```rust,no_run
//! use config_updater::core::{UpdateError, user_friendly_error};
//!
//! let error = UpdateError::install_failed("bundle has no config/ directory");
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Distinguishes why a registry query failed.
///
/// Both categories surface as [`UpdateError::Registry`]; the category is kept for
/// logging and for the CLI's suggestion text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryFailure {
    /// The registry could not be reached or answered with a non-success status
    Network,
    /// The registry answered, but the payload was not the expected document
    Malformed,
}

impl fmt::Display for RegistryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network failure"),
            Self::Malformed => write!(f, "malformed response"),
        }
    }
}

/// The error type for update checks and installs.
#[derive(Error, Debug, Clone)]
pub enum UpdateError {
    /// Registry unreachable or malformed during a version check
    #[error("Registry error ({kind}): {message}")]
    Registry {
        /// Whether the transport or the payload was at fault
        kind: RegistryFailure,
        /// Human-readable cause
        message: String,
    },

    /// Installation of a configuration bundle failed
    #[error("Configuration install failed: {reason}")]
    InstallFailed {
        /// Human-readable cause
        reason: String,
        /// Set when the install was rejected because another install holds the lock
        in_progress: bool,
    },

    /// The update lock is currently held by another installer
    #[error("Another configuration update is already in progress (lock: {lock_path})")]
    AlreadyInProgress {
        /// Path of the contended lock file
        lock_path: String,
    },

    /// A version string is not valid semantic versioning
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion {
        /// The rejected input
        version: String,
        /// Parser message
        reason: String,
    },

    /// Configuration could not be loaded
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
    },

    /// Any other failure, rendered as its message
    #[error("{message}")]
    Other {
        /// Message including the cause chain
        message: String,
    },
}

impl UpdateError {
    /// Builds a [`UpdateError::Registry`] for transport-level failures.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Registry {
            kind: RegistryFailure::Network,
            message: message.into(),
        }
    }

    /// Builds a [`UpdateError::Registry`] for payloads that are not what was asked for.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Registry {
            kind: RegistryFailure::Malformed,
            message: message.into(),
        }
    }

    /// Builds a [`UpdateError::InstallFailed`].
    pub fn install_failed(reason: impl Into<String>) -> Self {
        Self::InstallFailed {
            reason: reason.into(),
            in_progress: false,
        }
    }

    /// Wraps any error chain into [`UpdateError::InstallFailed`], prefixed with the
    /// step that failed. The whole `anyhow` chain is kept in the message.
    pub fn install_step(step: &str, cause: &anyhow::Error) -> Self {
        Self::InstallFailed {
            reason: format!("{step}: {cause:#}"),
            in_progress: false,
        }
    }

    /// Folds a lock-level error into [`UpdateError::InstallFailed`].
    ///
    /// [`UpdateError::AlreadyInProgress`] keeps its kind through the `in_progress` flag.
    #[must_use]
    pub fn into_install_failed(self) -> Self {
        match self {
            Self::InstallFailed {
                ..
            } => self,
            other => {
                let in_progress = matches!(other, Self::AlreadyInProgress { .. });
                Self::InstallFailed {
                    reason: other.to_string(),
                    in_progress,
                }
            }
        }
    }

    /// Returns true when the error means an install lost the race for the lock.
    ///
    /// Decided by the error kind alone, never by message text.
    #[must_use]
    pub const fn is_already_in_progress(&self) -> bool {
        match self {
            Self::AlreadyInProgress {
                ..
            } => true,
            Self::InstallFailed {
                in_progress,
                ..
            } => *in_progress,
            _ => false,
        }
    }
}

/// Error context wrapper used by the CLI to show details and suggestions.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: UpdateError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: UpdateError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr: error in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with suggestions for the CLI.
///
/// [`UpdateError`] values get tailored suggestions; anything else is rendered with
/// its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(update_error) = error.downcast_ref::<UpdateError>() {
        return create_error_context(update_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>()
        && io_error.kind() == std::io::ErrorKind::PermissionDenied
    {
        return ErrorContext::new(UpdateError::Other {
            message: format!("{error:#}"),
        })
        .with_suggestion("Check ownership and permissions of the configuration and cache directories");
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(UpdateError::Other {
        message,
    })
}

fn create_error_context(error: UpdateError) -> ErrorContext {
    const IN_PROGRESS_DETAILS: &str = "Only one install may run per cache directory at a time";

    let (suggestion, details) = match &error {
        UpdateError::Registry {
            kind: RegistryFailure::Network,
            ..
        } => (
            Some("Check your network connection and the configured registry URL"),
            Some("The registry could not be reached or returned an error status"),
        ),
        UpdateError::Registry {
            kind: RegistryFailure::Malformed,
            ..
        } => (
            Some(
                "Verify that the registry URL points at a package registry API and that the package name is correct",
            ),
            Some("The registry answered, but the response did not contain a version listing"),
        ),
        UpdateError::AlreadyInProgress {
            ..
        }
        | UpdateError::InstallFailed {
            in_progress: true,
            ..
        } => (Some("Wait for the other update to finish, then retry"), Some(IN_PROGRESS_DETAILS)),
        UpdateError::InstallFailed {
            ..
        } => (
            Some("Retry the install; a retry always repopulates the configuration directory"),
            None,
        ),
        UpdateError::InvalidVersion {
            ..
        } => (Some("Use a semantic version such as 7.2.4 or 7.2.5-20200424"), None),
        UpdateError::Config {
            ..
        } => (Some("Check the config-updater configuration file for syntax errors"), None),
        UpdateError::Other {
            ..
        } => (None, None),
    };

    let mut ctx = ErrorContext::new(error);
    if let Some(suggestion) = suggestion {
        ctx = ctx.with_suggestion(suggestion);
    }
    if let Some(details) = details {
        ctx = ctx.with_details(details);
    }
    ctx
}
